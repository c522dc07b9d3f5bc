use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::camera::CapturedFrame;
use super::MediaError;

/// Shared display capture geometry: frames are scaled and padded to this.
const SHARE_WIDTH: u32 = 1280;
const SHARE_HEIGHT: u32 = 720;

/// Send+Sync screen capture handle. Dropping it stops the ffmpeg reader
/// thread, which kills the child process.
pub struct ScreenCaptureHandle {
    running: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

unsafe impl Send for ScreenCaptureHandle {}
unsafe impl Sync for ScreenCaptureHandle {}

impl ScreenCaptureHandle {
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

impl Drop for ScreenCaptureHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Start full-screen capture via ffmpeg.
///
/// If the capture pipeline ends on its own (ffmpeg exits, the display
/// goes away), the frame channel closes; the media engine treats that as
/// an implicit stop and resynchronizes its state.
pub fn start_screen_capture(
) -> Result<(ScreenCaptureHandle, mpsc::Receiver<CapturedFrame>), MediaError> {
    let (tx, rx) = mpsc::channel::<CapturedFrame>(16);
    let running = Arc::new(AtomicBool::new(true));
    let running_thread = running.clone();

    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();

    let thread = std::thread::spawn(move || match find_ffmpeg() {
        Some(ffmpeg_path) => {
            if let Err(e) = run_ffmpeg_capture(&ffmpeg_path, &running_thread, &tx, &ready_tx) {
                let _ = ready_tx.send(Err(e));
            }
        }
        None => {
            let _ = ready_tx.send(Err(
                "No screen capture method available. Install ffmpeg for screen sharing.".into(),
            ));
        }
    });

    match ready_rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(MediaError::classify(e)),
        Err(_) => {
            return Err(MediaError::CaptureFailed(
                "Screen capture thread panicked".to_string(),
            ))
        }
    }

    Ok((
        ScreenCaptureHandle {
            running,
            _thread: thread,
        },
        rx,
    ))
}

/// Check a list of ffmpeg candidate paths and return the first that works.
fn check_ffmpeg_candidates(candidates: Vec<String>) -> Option<String> {
    for candidate in candidates {
        if std::process::Command::new(&candidate)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok()
        {
            info!("Found ffmpeg at: {}", candidate);
            return Some(candidate);
        }
    }
    None
}

#[cfg(target_os = "linux")]
fn find_ffmpeg() -> Option<String> {
    check_ffmpeg_candidates(vec![
        "ffmpeg".to_string(),
        "/usr/bin/ffmpeg".to_string(),
        "/usr/local/bin/ffmpeg".to_string(),
    ])
}

#[cfg(target_os = "windows")]
fn find_ffmpeg() -> Option<String> {
    let mut candidates = vec![
        "ffmpeg".to_string(),
        r"C:\ffmpeg\bin\ffmpeg.exe".to_string(),
        r"C:\Program Files\ffmpeg\bin\ffmpeg.exe".to_string(),
    ];
    if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
        candidates.push(format!(
            r"{}\Microsoft\WinGet\Links\ffmpeg.exe",
            local_app_data
        ));
    }
    check_ffmpeg_candidates(candidates)
}

#[cfg(target_os = "macos")]
fn find_ffmpeg() -> Option<String> {
    check_ffmpeg_candidates(vec![
        "ffmpeg".to_string(),
        "/opt/homebrew/bin/ffmpeg".to_string(),
        "/usr/local/bin/ffmpeg".to_string(),
    ])
}

/// Build platform-specific ffmpeg input arguments (Linux/X11).
#[cfg(target_os = "linux")]
fn build_ffmpeg_input_args(cmd: &mut std::process::Command) {
    let x11_display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
    let (sw, sh) = get_screen_resolution().unwrap_or((1920, 1080));
    let video_size = format!("{}x{}", sw, sh);
    info!("Capturing full screen: {} on {}", video_size, x11_display);
    cmd.args([
        "-f",
        "x11grab",
        "-framerate",
        "10",
        "-video_size",
        &video_size,
        "-i",
        &x11_display,
    ]);
}

#[cfg(target_os = "windows")]
fn build_ffmpeg_input_args(cmd: &mut std::process::Command) {
    info!("Capturing full screen via gdigrab");
    cmd.args(["-f", "gdigrab", "-framerate", "10", "-i", "desktop"]);
}

#[cfg(target_os = "macos")]
fn build_ffmpeg_input_args(cmd: &mut std::process::Command) {
    info!("Capturing full screen via avfoundation");
    cmd.args([
        "-f",
        "avfoundation",
        "-framerate",
        "10",
        "-capture_cursor",
        "1",
        "-i",
        "Capture screen 0:",
    ]);
}

/// Get the screen resolution via xdpyinfo (Linux).
#[cfg(target_os = "linux")]
fn get_screen_resolution() -> Option<(u32, u32)> {
    use std::process::{Command, Stdio};

    let output = Command::new("xdpyinfo")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("dimensions:") {
            let dims = rest.split_whitespace().next()?;
            let (w, h) = dims.split_once('x')?;
            if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                return Some((w, h));
            }
        }
    }
    None
}

/// Use ffmpeg to capture the screen and pipe JPEG frames.
fn run_ffmpeg_capture(
    ffmpeg_path: &str,
    running: &Arc<AtomicBool>,
    tx: &mpsc::Sender<CapturedFrame>,
    ready_tx: &std::sync::mpsc::Sender<Result<(), String>>,
) -> Result<(), String> {
    use std::io::Read;
    use std::process::{Command, Stdio};

    let mut cmd = Command::new(ffmpeg_path);
    build_ffmpeg_input_args(&mut cmd);

    // Shared output args: scale, JPEG pipe.
    let scale = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = SHARE_WIDTH,
        h = SHARE_HEIGHT
    );
    cmd.args([
        "-vf", &scale, "-f", "image2pipe", "-vcodec", "mjpeg", "-q:v", "5", "-r", "10", "pipe:1",
    ]);

    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("Failed to start ffmpeg: {}", e))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| "Failed to get ffmpeg stdout".to_string())?;

    // Drain and log ffmpeg stderr on a side thread.
    if let Some(stderr) = child.stderr.take() {
        std::thread::spawn(move || {
            use std::io::BufRead;
            let reader = std::io::BufReader::new(stderr);
            for line in reader.lines() {
                match line {
                    Ok(line) => debug!("ffmpeg: {}", line),
                    Err(_) => break,
                }
            }
        });
    }

    info!("Screen capture started via ffmpeg");
    let _ = ready_tx.send(Ok(()));

    let mut buf = vec![0u8; 256 * 1024];
    let mut frame_buf = Vec::with_capacity(256 * 1024);

    while running.load(Ordering::Relaxed) {
        match stdout.read(&mut buf) {
            Ok(0) => {
                if let Ok(status) = child.wait() {
                    if !status.success() {
                        error!("ffmpeg exited with status: {}", status);
                    }
                }
                break;
            }
            Ok(n) => {
                frame_buf.extend_from_slice(&buf[..n]);

                while let Some(frame) = extract_jpeg_frame(&mut frame_buf) {
                    let _ = tx.try_send(CapturedFrame {
                        jpeg_data: frame,
                        width: SHARE_WIDTH,
                        height: SHARE_HEIGHT,
                    });
                }
            }
            Err(e) => {
                if running.load(Ordering::Relaxed) {
                    error!("ffmpeg read error: {}", e);
                }
                break;
            }
        }
    }

    let _ = child.kill();
    info!("Screen capture thread exiting");
    Ok(())
}

/// Extract a complete JPEG frame from the buffer.
/// JPEG starts with 0xFF 0xD8 and ends with 0xFF 0xD9.
fn extract_jpeg_frame(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let start = buf.windows(2).position(|w| w == [0xFF, 0xD8])?;
    let end_search = &buf[start + 2..];
    let end_offset = end_search.windows(2).position(|w| w == [0xFF, 0xD9])?;
    let end = start + 2 + end_offset + 2;

    if end > buf.len() {
        return None;
    }

    let frame = buf[start..end].to_vec();
    buf.drain(..end);
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_extraction_handles_partial_and_complete_frames() {
        let mut buf = vec![0x00, 0xFF, 0xD8, 0x01, 0x02];
        assert!(extract_jpeg_frame(&mut buf).is_none());

        buf.extend_from_slice(&[0xFF, 0xD9, 0xFF, 0xD8]);
        let frame = extract_jpeg_frame(&mut buf).unwrap();
        assert_eq!(frame, vec![0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9]);
        // The trailing partial frame stays buffered.
        assert_eq!(buf, vec![0xFF, 0xD8]);
    }
}
