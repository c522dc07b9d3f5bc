use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::{broadcast, RwLock};

use super::camera::CapturedFrame;

/// Where the live camera pixels land for the engagement sampler: an
/// opaque capability the media engine hands out, decoupling frame
/// storage from frame capture. Detaching clears the cached frame so a
/// torn-down camera can never serve stale pixels.
#[derive(Clone, Default)]
pub struct VideoSink {
    inner: Arc<StdRwLock<SinkInner>>,
}

#[derive(Default)]
struct SinkInner {
    attached: bool,
    frame: Option<CapturedFrame>,
}

impl VideoSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self) {
        self.inner.write().unwrap().attached = true;
    }

    pub fn detach(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.attached = false;
        inner.frame = None;
    }

    pub fn is_attached(&self) -> bool {
        self.inner.read().unwrap().attached
    }

    pub fn push(&self, frame: CapturedFrame) {
        let mut inner = self.inner.write().unwrap();
        if inner.attached {
            inner.frame = Some(frame);
        }
    }

    pub fn latest(&self) -> Option<CapturedFrame> {
        self.inner.read().unwrap().frame.clone()
    }
}

/// Shared state for the local preview frame server: the webview renders
/// the user's own camera and screen capture from here as MJPEG.
#[derive(Clone)]
pub struct PreviewState {
    camera_tx: broadcast::Sender<Vec<u8>>,
    screen_tx: broadcast::Sender<Vec<u8>>,
    latest_camera: Arc<RwLock<Option<Arc<Vec<u8>>>>>,
    latest_screen: Arc<RwLock<Option<Arc<Vec<u8>>>>>,
}

impl PreviewState {
    pub fn new() -> Self {
        let (camera_tx, _) = broadcast::channel(8);
        let (screen_tx, _) = broadcast::channel(8);
        Self {
            camera_tx,
            screen_tx,
            latest_camera: Arc::new(RwLock::new(None)),
            latest_screen: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn push_camera_frame(&self, jpeg_data: Vec<u8>) {
        *self.latest_camera.write().await = Some(Arc::new(jpeg_data.clone()));
        let _ = self.camera_tx.send(jpeg_data);
    }

    pub async fn push_screen_frame(&self, jpeg_data: Vec<u8>) {
        *self.latest_screen.write().await = Some(Arc::new(jpeg_data.clone()));
        let _ = self.screen_tx.send(jpeg_data);
    }

    pub async fn clear_camera(&self) {
        *self.latest_camera.write().await = None;
    }

    pub async fn clear_screen(&self) {
        *self.latest_screen.write().await = None;
    }
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::new()
    }
}

/// MJPEG stream handler for the local camera preview.
async fn camera_stream(State(state): State<PreviewState>) -> impl IntoResponse {
    serve_mjpeg_stream(state.camera_tx.subscribe())
}

/// MJPEG stream handler for the local screen share preview.
async fn screen_stream(State(state): State<PreviewState>) -> impl IntoResponse {
    serve_mjpeg_stream(state.screen_tx.subscribe())
}

/// Serve an MJPEG stream from a broadcast channel.
fn serve_mjpeg_stream(rx: broadcast::Receiver<Vec<u8>>) -> axum::response::Response {
    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(jpeg_data) => {
                    let header = format!(
                        "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
                        jpeg_data.len()
                    );
                    yield Ok::<_, std::io::Error>(bytes::Bytes::from(header));
                    yield Ok(bytes::Bytes::from(jpeg_data));
                    yield Ok(bytes::Bytes::from("\r\n"));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Skip missed frames
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    axum::response::Response::builder()
        .header("Content-Type", "multipart/x-mixed-replace; boundary=frame")
        .header("Cache-Control", "no-cache, no-store, must-revalidate")
        .header("Access-Control-Allow-Origin", "*")
        .body(axum::body::Body::from_stream(stream))
        .unwrap()
}

/// Single-frame handler for the camera (returns latest JPEG).
async fn camera_frame(State(state): State<PreviewState>) -> axum::response::Response {
    serve_single_frame(&state.latest_camera).await
}

/// Single-frame handler for the screen share (returns latest JPEG).
async fn screen_frame(State(state): State<PreviewState>) -> axum::response::Response {
    serve_single_frame(&state.latest_screen).await
}

/// Serve the latest cached JPEG frame.
async fn serve_single_frame(
    frame: &Arc<RwLock<Option<Arc<Vec<u8>>>>>,
) -> axum::response::Response {
    let frame = frame.read().await;
    match frame.as_ref() {
        Some(jpeg_data) => axum::response::Response::builder()
            .header("Content-Type", "image/jpeg")
            .header("Cache-Control", "no-cache, no-store, must-revalidate")
            .header("Access-Control-Allow-Origin", "*")
            .body(axum::body::Body::from(jpeg_data.as_ref().clone()))
            .unwrap(),
        None => axum::response::Response::builder()
            .status(404)
            .body(axum::body::Body::from("No frame available"))
            .unwrap(),
    }
}

/// Build the preview router (nested into the main API server).
pub fn preview_routes(state: PreviewState) -> Router {
    Router::new()
        .route("/media/camera", get(camera_stream))
        .route("/media/camera/frame", get(camera_frame))
        .route("/media/screen", get(screen_stream))
        .route("/media/screen/frame", get(screen_frame))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bytes: &[u8]) -> CapturedFrame {
        CapturedFrame {
            jpeg_data: bytes.to_vec(),
            width: 2,
            height: 2,
        }
    }

    #[test]
    fn sink_only_caches_while_attached() {
        let sink = VideoSink::new();
        sink.push(frame(&[1, 2, 3]));
        assert!(sink.latest().is_none());

        sink.attach();
        sink.push(frame(&[4, 5, 6]));
        assert_eq!(sink.latest().unwrap().jpeg_data, vec![4, 5, 6]);
    }

    #[test]
    fn detach_clears_the_cached_frame() {
        let sink = VideoSink::new();
        sink.attach();
        sink.push(frame(&[7, 8]));
        sink.detach();
        assert!(!sink.is_attached());
        assert!(sink.latest().is_none());
    }
}
