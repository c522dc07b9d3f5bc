use image::codecs::jpeg::JpegEncoder;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::MediaError;

/// Requested capture geometry; also the fallback when a frame reports
/// zero dimensions.
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

/// JPEG quality for captured frames (out of 100).
pub const JPEG_QUALITY: u8 = 85;

/// Camera device info returned to the frontend/API.
#[derive(Debug, Clone, Serialize)]
pub struct CameraDevice {
    pub index: u32,
    pub name: String,
    pub is_default: bool,
}

/// A single captured frame: JPEG-encoded bytes plus pixel dimensions.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub jpeg_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// List available cameras.
pub fn list_cameras() -> Vec<CameraDevice> {
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) => devices
            .into_iter()
            .enumerate()
            .map(|(i, info)| CameraDevice {
                index: info.index().as_index().unwrap_or(i as u32),
                name: info.human_name().to_string(),
                is_default: i == 0,
            })
            .collect(),
        Err(e) => {
            warn!("Failed to query cameras: {}", e);
            Vec::new()
        }
    }
}

/// Send+Sync camera handle. The nokhwa Camera lives on a dedicated
/// thread; dropping the handle stops the capture loop and releases the
/// device.
pub struct CameraHandle {
    running: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

unsafe impl Send for CameraHandle {}
unsafe impl Sync for CameraHandle {}

impl CameraHandle {
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

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Start capturing from a camera at 640x480 / 15 fps.
/// Frames arrive JPEG-encoded on the returned channel.
pub fn start_camera(
    device_index: Option<u32>,
) -> Result<(CameraHandle, mpsc::Receiver<CapturedFrame>), MediaError> {
    let (tx, rx) = mpsc::channel::<CapturedFrame>(16);
    let running = Arc::new(AtomicBool::new(true));
    let running_thread = running.clone();

    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();

    let thread = std::thread::spawn(move || {
        let index = CameraIndex::Index(device_index.unwrap_or(0));

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(CAPTURE_WIDTH, CAPTURE_HEIGHT),
                FrameFormat::MJPEG,
                15,
            ),
        ));

        let mut camera = match Camera::new(index, requested) {
            Ok(c) => c,
            Err(e) => {
                let _ = ready_tx.send(Err(format!("Failed to open camera: {}", e)));
                return;
            }
        };

        if let Err(e) = camera.open_stream() {
            let _ = ready_tx.send(Err(format!("Failed to open camera stream: {}", e)));
            return;
        }

        info!(
            "Camera started: {} ({}x{})",
            camera.info().human_name(),
            CAPTURE_WIDTH,
            CAPTURE_HEIGHT
        );
        let _ = ready_tx.send(Ok(()));

        while running_thread.load(Ordering::Relaxed) {
            match camera.frame() {
                Ok(frame) => {
                    let resolution = frame.resolution();
                    match frame.decode_image::<RgbFormat>() {
                        Ok(rgb_image) => {
                            let mut jpeg_buf = Vec::new();
                            let encoder =
                                JpegEncoder::new_with_quality(&mut jpeg_buf, JPEG_QUALITY);
                            if let Err(e) = rgb_image.write_with_encoder(encoder) {
                                error!("JPEG encode failed: {}", e);
                                continue;
                            }
                            let _ = tx.try_send(CapturedFrame {
                                jpeg_data: jpeg_buf,
                                width: resolution.width(),
                                height: resolution.height(),
                            });
                        }
                        Err(e) => {
                            error!("Frame decode failed: {}", e);
                        }
                    }
                }
                Err(e) => {
                    if running_thread.load(Ordering::Relaxed) {
                        error!("Camera frame error: {}", e);
                    }
                    break;
                }
            }

            // ~15 fps
            std::thread::sleep(std::time::Duration::from_millis(66));
        }

        drop(camera);
        info!("Camera capture thread exiting");
    });

    match ready_rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(MediaError::classify(e)),
        Err(_) => {
            return Err(MediaError::CaptureFailed(
                "Camera thread panicked".to_string(),
            ))
        }
    }

    Ok((
        CameraHandle {
            running,
            _thread: thread,
        },
        rx,
    ))
}
