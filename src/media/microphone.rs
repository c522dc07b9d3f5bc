use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::MediaError;

/// Audio input device info returned to the frontend/API.
#[derive(Debug, Clone, Serialize)]
pub struct AudioDevice {
    pub name: String,
    pub is_default: bool,
}

/// List available input devices.
pub fn list_devices() -> Vec<AudioDevice> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                let is_default = default_name.as_deref() == Some(&name);
                devices.push(AudioDevice { name, is_default });
            }
        }
    }

    devices
}

/// Send+Sync capture handle. The cpal::Stream (which is !Send) lives on
/// a dedicated thread; we communicate via the `running` flag, and
/// dropping the handle releases the device.
pub struct MicrophoneHandle {
    running: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

// Safety: the cpal::Stream is confined to its own thread; only the
// AtomicBool flag crosses thread boundaries.
unsafe impl Send for MicrophoneHandle {}
unsafe impl Sync for MicrophoneHandle {}

impl MicrophoneHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn dummy() -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread = std::thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                std::thread::sleep(std::time::Duration::from_millis(5));
            }
        });
        Self {
            running,
            _thread: thread,
        }
    }
}

impl Drop for MicrophoneHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Start capturing from the default input device.
/// Returns f32 PCM frames (mono, 48kHz, 960-sample chunks = 20ms) used
/// for local voice-activity metering.
pub fn start_capture() -> Result<(MicrophoneHandle, mpsc::Receiver<Vec<f32>>), MediaError> {
    let (tx, rx) = mpsc::channel::<Vec<f32>>(64);
    let running = Arc::new(AtomicBool::new(true));
    let running_thread = running.clone();
    let running_callback = running.clone();

    // Build the stream on a dedicated thread so the !Send cpal::Stream
    // never crosses a thread boundary.
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();

    let thread = std::thread::spawn(move || {
        let host = cpal::default_host();
        let device = match host.default_input_device() {
            Some(d) => d,
            None => {
                let _ = ready_tx.send(Err("No input device available".into()));
                return;
            }
        };

        let device_name = device.name().unwrap_or_else(|_| "unknown".into());
        info!("Using input device: {}", device_name);

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(48000),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut buffer = Vec::with_capacity(960);

        let stream = match device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if !running_callback.load(Ordering::Relaxed) {
                    return;
                }
                for &sample in data {
                    buffer.push(sample);
                    if buffer.len() >= 960 {
                        let frame = std::mem::replace(&mut buffer, Vec::with_capacity(960));
                        let _ = tx.try_send(frame);
                    }
                }
            },
            move |err| {
                error!("Audio capture error: {}", err);
            },
            None,
        ) {
            Ok(s) => s,
            Err(e) => {
                let _ = ready_tx.send(Err(format!("Failed to build input stream: {}", e)));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(format!("Failed to start input stream: {}", e)));
            return;
        }

        let _ = ready_tx.send(Ok(()));

        while running_thread.load(Ordering::Relaxed) {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        drop(stream);
        info!("Microphone capture thread exiting");
    });

    match ready_rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(MediaError::classify(e)),
        Err(_) => {
            return Err(MediaError::CaptureFailed(
                "Microphone thread panicked".to_string(),
            ))
        }
    }

    Ok((
        MicrophoneHandle {
            running,
            _thread: thread,
        },
        rx,
    ))
}
