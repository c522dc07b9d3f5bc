use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb};
use tokio::sync::watch;
use tracing::debug;

use crate::media::camera::{CAPTURE_HEIGHT, CAPTURE_WIDTH, JPEG_QUALITY};
use crate::media::frame_server::VideoSink;
use crate::media::ClassSessionState;

/// One frame ready for the analyzer.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Why a capture produced nothing. All of these are expected, frequent
/// conditions (e.g. the first tick fires before the camera delivers a
/// frame) and must never abort the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSkip {
    CameraOff,
    SinkDetached,
    AwaitingFirstFrame,
}

/// Produces one still image from the active camera stream on demand.
/// Holds only a sink capability and a session snapshot; it never touches
/// the capture hardware.
pub struct FrameSampler {
    sink: VideoSink,
    session_rx: watch::Receiver<ClassSessionState>,
}

impl FrameSampler {
    pub fn new(sink: VideoSink, session_rx: watch::Receiver<ClassSessionState>) -> Self {
        Self { sink, session_rx }
    }

    /// Capture the latest camera frame. Preconditions are checked in
    /// order and produce distinct skip reasons; an undecodable frame is
    /// replaced by a flat placeholder rather than an error.
    pub fn capture(&self) -> Result<EncodedFrame, CaptureSkip> {
        if !self.session_rx.borrow().camera_enabled {
            return Err(CaptureSkip::CameraOff);
        }
        if !self.sink.is_attached() {
            return Err(CaptureSkip::SinkDetached);
        }
        let frame = self.sink.latest().ok_or(CaptureSkip::AwaitingFirstFrame)?;

        let width = if frame.width > 0 { frame.width } else { CAPTURE_WIDTH };
        let height = if frame.height > 0 { frame.height } else { CAPTURE_HEIGHT };

        let jpeg_data = match image::load_from_memory(&frame.jpeg_data) {
            Ok(_) => frame.jpeg_data,
            Err(e) => {
                debug!("Frame undecodable ({}), substituting placeholder", e);
                placeholder_jpeg(width, height)
            }
        };

        Ok(EncodedFrame {
            data_uri: format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg_data)),
            width,
            height,
        })
    }
}

/// Flat mid-gray JPEG of the requested dimensions.
fn placeholder_jpeg(width: u32, height: u32) -> Vec<u8> {
    let gray = ImageBuffer::from_pixel(width, height, Rgb([0x88u8, 0x88, 0x88]));
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    // Encoding a flat in-memory buffer into a Vec cannot fail.
    image::DynamicImage::ImageRgb8(gray)
        .write_with_encoder(encoder)
        .expect("placeholder JPEG encoding");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::camera::CapturedFrame;

    fn session(camera_enabled: bool) -> watch::Receiver<ClassSessionState> {
        // Receivers keep serving the last value after the sender drops.
        let (_tx, rx) = watch::channel(ClassSessionState {
            camera_enabled,
            ..Default::default()
        });
        rx
    }

    fn tiny_jpeg() -> Vec<u8> {
        placeholder_jpeg(4, 4)
    }

    #[test]
    fn preconditions_are_checked_in_order() {
        let sink = VideoSink::new();
        let sampler = FrameSampler::new(sink.clone(), session(false));
        assert_eq!(sampler.capture().unwrap_err(), CaptureSkip::CameraOff);

        let sampler = FrameSampler::new(sink.clone(), session(true));
        assert_eq!(sampler.capture().unwrap_err(), CaptureSkip::SinkDetached);

        sink.attach();
        assert_eq!(
            sampler.capture().unwrap_err(),
            CaptureSkip::AwaitingFirstFrame
        );
    }

    #[test]
    fn valid_frames_pass_through_as_data_uris() {
        let sink = VideoSink::new();
        sink.attach();
        let jpeg = tiny_jpeg();
        sink.push(CapturedFrame {
            jpeg_data: jpeg.clone(),
            width: 4,
            height: 4,
        });

        let sampler = FrameSampler::new(sink, session(true));
        let frame = sampler.capture().unwrap();
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 4);

        let encoded = frame
            .data_uri
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data URI prefix");
        assert_eq!(BASE64.decode(encoded).unwrap(), jpeg);
    }

    #[test]
    fn undecodable_frames_become_placeholders() {
        let sink = VideoSink::new();
        sink.attach();
        sink.push(CapturedFrame {
            jpeg_data: vec![0xde, 0xad, 0xbe, 0xef],
            width: 8,
            height: 6,
        });

        let sampler = FrameSampler::new(sink, session(true));
        let frame = sampler.capture().unwrap();
        let encoded = frame
            .data_uri
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        let bytes = BASE64.decode(encoded).unwrap();
        let image = image::load_from_memory(&bytes).expect("placeholder decodes");
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 6);
    }

    #[test]
    fn zero_dimensions_fall_back_to_the_capture_default() {
        let sink = VideoSink::new();
        sink.attach();
        sink.push(CapturedFrame {
            jpeg_data: vec![0x00],
            width: 0,
            height: 0,
        });

        let sampler = FrameSampler::new(sink, session(true));
        let frame = sampler.capture().unwrap();
        assert_eq!(frame.width, CAPTURE_WIDTH);
        assert_eq!(frame.height, CAPTURE_HEIGHT);
    }
}
