use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::engagement::client::AnalyzerApi;
use crate::engagement::poller::{self, PollerHandle};
use crate::engagement::sampler::FrameSampler;
use crate::engagement::EngagementFeed;
use crate::events::{AppEvent, EventSender};

use super::camera::{self, CapturedFrame};
use super::frame_server::{PreviewState, VideoSink};
use super::microphone;
use super::screen;
use super::{ClassSessionState, MediaCommand};

/// Exclusive owner of the capture handles. At most one live handle per
/// device kind; a disable stops the handle before the flag flips, and
/// `shutdown` stops everything regardless of flags.
#[derive(Default)]
struct MediaSession {
    camera: Option<camera::CameraHandle>,
    microphone: Option<microphone::MicrophoneHandle>,
    screen: Option<screen::ScreenCaptureHandle>,
    camera_enabled: bool,
    mic_enabled: bool,
    screen_sharing: bool,
}

impl MediaSession {
    /// Returns whether the camera was enabled. The microphone pipeline
    /// is independent and stays untouched.
    fn disable_camera(&mut self) -> bool {
        if let Some(handle) = self.camera.take() {
            handle.stop();
        }
        std::mem::replace(&mut self.camera_enabled, false)
    }

    fn disable_microphone(&mut self) -> bool {
        if let Some(handle) = self.microphone.take() {
            handle.stop();
        }
        std::mem::replace(&mut self.mic_enabled, false)
    }

    fn stop_screen(&mut self) -> bool {
        if let Some(handle) = self.screen.take() {
            handle.stop();
        }
        std::mem::replace(&mut self.screen_sharing, false)
    }

    /// Stop every held track regardless of flag state.
    fn shutdown(&mut self) {
        if let Some(handle) = self.camera.take() {
            handle.stop();
        }
        if let Some(handle) = self.microphone.take() {
            handle.stop();
        }
        if let Some(handle) = self.screen.take() {
            handle.stop();
        }
        self.camera_enabled = false;
        self.mic_enabled = false;
        self.screen_sharing = false;
    }

    fn snapshot(&self, speaking: bool, analyzing: bool) -> ClassSessionState {
        ClassSessionState {
            camera_enabled: self.camera_enabled,
            mic_enabled: self.mic_enabled,
            screen_sharing: self.screen_sharing,
            analyzing,
            speaking,
        }
    }
}

async fn next_frame<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Run the media engine event loop.
/// Owns the camera, microphone, and screen capture handles, the local
/// frame sink/preview, and the engagement polling session lifecycle.
pub async fn run_media_engine(
    mut cmd_rx: mpsc::Receiver<MediaCommand>,
    session_tx: watch::Sender<ClassSessionState>,
    event_tx: EventSender,
    preview: PreviewState,
    sink: VideoSink,
    analyzer: Arc<dyn AnalyzerApi>,
    feed: EngagementFeed,
) {
    info!("Media engine started");

    let mut session = MediaSession::default();
    let mut camera_rx: Option<mpsc::Receiver<CapturedFrame>> = None;
    let mut mic_rx: Option<mpsc::Receiver<Vec<f32>>> = None;
    let mut screen_rx: Option<mpsc::Receiver<CapturedFrame>> = None;
    let mut poller: Option<PollerHandle> = None;

    // Voice activity detection state
    let mut speaking = false;
    let speaking_threshold: f32 = 0.01; // RMS threshold
    let mut audio_level: f32 = 0.0;
    let audio_level_smoothing: f32 = 0.3;

    let publish = |tx: &watch::Sender<ClassSessionState>,
                   session: &MediaSession,
                   speaking: bool,
                   analyzing: bool| {
        let _ = tx.send(session.snapshot(speaking, analyzing));
    };

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    // Command side went away: the app is shutting down.
                    break;
                };
                match cmd {
                    MediaCommand::EnableCamera { device_index, reply } => {
                        if session.camera_enabled {
                            info!("Camera already enabled");
                            let _ = reply.send(Ok(()));
                            continue;
                        }

                        match camera::start_camera(device_index) {
                            Ok((handle, rx)) => {
                                session.camera = Some(handle);
                                camera_rx = Some(rx);
                                session.camera_enabled = true;
                                sink.attach();
                                info!("Camera enabled");

                                // The poller initializes the analyzer and
                                // runs the 3s analysis loop until cancelled.
                                let sampler =
                                    FrameSampler::new(sink.clone(), session_tx.subscribe());
                                poller = Some(poller::spawn(
                                    analyzer.clone(),
                                    sampler,
                                    feed.clone(),
                                    event_tx.clone(),
                                ));

                                publish(&session_tx, &session, speaking, poller.is_some());
                                let _ = event_tx.send(AppEvent::SessionStateChanged(
                                    session.snapshot(speaking, poller.is_some()),
                                ));
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                error!("Failed to enable camera: {}", e);
                                let _ = reply.send(Err(e));
                            }
                        }
                    }

                    MediaCommand::DisableCamera => {
                        // Cancel polling synchronously before the handle
                        // is released; late analyze results are dropped.
                        if let Some(poller) = poller.take() {
                            poller.cancel();
                        }
                        let was_enabled = session.disable_camera();
                        camera_rx = None;
                        sink.detach();
                        preview.clear_camera().await;
                        if was_enabled {
                            info!("Camera disabled");
                        }
                        publish(&session_tx, &session, speaking, false);
                        let _ = event_tx.send(AppEvent::SessionStateChanged(
                            session.snapshot(speaking, false),
                        ));
                    }

                    MediaCommand::EnableMicrophone { reply } => {
                        if session.mic_enabled {
                            info!("Microphone already enabled");
                            let _ = reply.send(Ok(()));
                            continue;
                        }

                        match microphone::start_capture() {
                            Ok((handle, rx)) => {
                                session.microphone = Some(handle);
                                mic_rx = Some(rx);
                                session.mic_enabled = true;
                                info!("Microphone enabled");
                                publish(&session_tx, &session, speaking, poller.is_some());
                                let _ = event_tx.send(AppEvent::SessionStateChanged(
                                    session.snapshot(speaking, poller.is_some()),
                                ));
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                error!("Failed to enable microphone: {}", e);
                                let _ = reply.send(Err(e));
                            }
                        }
                    }

                    MediaCommand::DisableMicrophone => {
                        let was_enabled = session.disable_microphone();
                        mic_rx = None;
                        if speaking {
                            speaking = false;
                            let _ = event_tx.send(AppEvent::SpeakingChanged { speaking: false });
                        }
                        audio_level = 0.0;
                        if was_enabled {
                            info!("Microphone disabled");
                        }
                        publish(&session_tx, &session, speaking, poller.is_some());
                        let _ = event_tx.send(AppEvent::SessionStateChanged(
                            session.snapshot(speaking, poller.is_some()),
                        ));
                    }

                    MediaCommand::StartScreenShare { reply } => {
                        if session.screen_sharing {
                            info!("Screen sharing already active");
                            let _ = reply.send(Ok(()));
                            continue;
                        }

                        match screen::start_screen_capture() {
                            Ok((handle, rx)) => {
                                session.screen = Some(handle);
                                screen_rx = Some(rx);
                                session.screen_sharing = true;
                                info!("Screen sharing started");
                                publish(&session_tx, &session, speaking, poller.is_some());
                                let _ = event_tx.send(AppEvent::SessionStateChanged(
                                    session.snapshot(speaking, poller.is_some()),
                                ));
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                error!("Failed to start screen share: {}", e);
                                let _ = reply.send(Err(e));
                            }
                        }
                    }

                    MediaCommand::StopScreenShare => {
                        let was_sharing = session.stop_screen();
                        screen_rx = None;
                        preview.clear_screen().await;
                        if was_sharing {
                            info!("Screen sharing stopped");
                        }
                        publish(&session_tx, &session, speaking, poller.is_some());
                        let _ = event_tx.send(AppEvent::SessionStateChanged(
                            session.snapshot(speaking, poller.is_some()),
                        ));
                    }

                    MediaCommand::LeaveSession => {
                        info!("Leaving classroom session");
                        if let Some(poller) = poller.take() {
                            poller.cancel();
                        }
                        session.shutdown();
                        camera_rx = None;
                        mic_rx = None;
                        screen_rx = None;
                        sink.detach();
                        preview.clear_camera().await;
                        preview.clear_screen().await;
                        speaking = false;
                        audio_level = 0.0;
                        publish(&session_tx, &session, speaking, false);
                        let _ = event_tx.send(AppEvent::SessionStateChanged(
                            session.snapshot(speaking, false),
                        ));
                    }
                }
            }

            // Camera frames: feed the sampler sink and the local preview.
            frame = next_frame(&mut camera_rx) => {
                match frame {
                    Some(frame) => {
                        sink.push(frame.clone());
                        preview.push_camera_frame(frame.jpeg_data).await;
                    }
                    None => {
                        // Capture thread died (device unplugged or bad
                        // state): resynchronize to camera-off.
                        warn!("Camera capture ended unexpectedly");
                        if let Some(poller) = poller.take() {
                            poller.cancel();
                        }
                        session.disable_camera();
                        camera_rx = None;
                        sink.detach();
                        preview.clear_camera().await;
                        publish(&session_tx, &session, speaking, false);
                        let _ = event_tx.send(AppEvent::SessionStateChanged(
                            session.snapshot(speaking, false),
                        ));
                    }
                }
            }

            // Microphone frames: local voice-activity metering.
            pcm = next_frame(&mut mic_rx) => {
                match pcm {
                    Some(pcm_frame) => {
                        let rms = (pcm_frame.iter().map(|s| s * s).sum::<f32>()
                            / pcm_frame.len().max(1) as f32)
                            .sqrt();
                        audio_level =
                            audio_level * (1.0 - audio_level_smoothing) + rms * audio_level_smoothing;

                        let now_speaking = audio_level > speaking_threshold;
                        if now_speaking != speaking {
                            speaking = now_speaking;
                            let _ = event_tx.send(AppEvent::SpeakingChanged { speaking });
                            publish(&session_tx, &session, speaking, poller.is_some());
                        }
                    }
                    None => {
                        debug!("Microphone capture ended");
                        session.disable_microphone();
                        mic_rx = None;
                        if speaking {
                            speaking = false;
                            let _ = event_tx.send(AppEvent::SpeakingChanged { speaking: false });
                        }
                        publish(&session_tx, &session, speaking, poller.is_some());
                    }
                }
            }

            // Screen frames: local preview only.
            frame = next_frame(&mut screen_rx) => {
                match frame {
                    Some(frame) => {
                        preview.push_screen_frame(frame.jpeg_data).await;
                    }
                    None => {
                        // ffmpeg exited on its own (e.g. the user killed
                        // it or the display went away): implicit stop.
                        info!("Screen capture ended outside app controls");
                        session.stop_screen();
                        screen_rx = None;
                        preview.clear_screen().await;
                        let _ = event_tx.send(AppEvent::ScreenShareEnded);
                        publish(&session_tx, &session, speaking, poller.is_some());
                        let _ = event_tx.send(AppEvent::SessionStateChanged(
                            session.snapshot(speaking, poller.is_some()),
                        ));
                    }
                }
            }
        }
    }

    // Defensive teardown on every exit path: no leaked device handles.
    if let Some(poller) = poller.take() {
        poller.cancel();
    }
    session.shutdown();
    sink.detach();
    publish(&session_tx, &session, false, false);
    info!("Media engine stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::client::{AnalyzeOutcome, AnalyzerApi};
    use crate::events::create_event_bus;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct UnreachableAnalyzer;

    #[async_trait]
    impl AnalyzerApi for UnreachableAnalyzer {
        async fn check_status(&self) -> bool {
            false
        }

        async fn initialize(&self, _context: &str) -> Result<(), String> {
            Err("unreachable".to_string())
        }

        async fn analyze(&self, _image: &str) -> AnalyzeOutcome {
            AnalyzeOutcome::Failure {
                message: "unreachable".to_string(),
            }
        }
    }

    fn spawn_engine() -> (
        mpsc::Sender<MediaCommand>,
        watch::Receiver<ClassSessionState>,
        tokio::task::JoinHandle<()>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (session_tx, session_rx) = watch::channel(ClassSessionState::default());
        let (event_tx, _event_rx) = create_event_bus();
        let handle = tokio::spawn(run_media_engine(
            cmd_rx,
            session_tx,
            event_tx,
            PreviewState::new(),
            VideoSink::new(),
            Arc::new(UnreachableAnalyzer),
            EngagementFeed::new(),
        ));
        (cmd_tx, session_rx, handle)
    }

    #[tokio::test]
    async fn disable_camera_is_idempotent() {
        let (cmd_tx, mut session_rx, engine) = spawn_engine();

        cmd_tx.send(MediaCommand::DisableCamera).await.unwrap();
        session_rx.changed().await.unwrap();
        let first = session_rx.borrow_and_update().clone();

        cmd_tx.send(MediaCommand::DisableCamera).await.unwrap();
        session_rx.changed().await.unwrap();
        let second = session_rx.borrow_and_update().clone();

        assert_eq!(first, ClassSessionState::default());
        assert_eq!(first, second);

        drop(cmd_tx);
        tokio::time::timeout(Duration::from_secs(1), engine)
            .await
            .expect("engine exits on command channel close")
            .unwrap();
    }

    #[tokio::test]
    async fn leave_session_resets_everything() {
        let (cmd_tx, session_rx, engine) = spawn_engine();

        cmd_tx.send(MediaCommand::StopScreenShare).await.unwrap();
        cmd_tx.send(MediaCommand::DisableMicrophone).await.unwrap();
        cmd_tx.send(MediaCommand::LeaveSession).await.unwrap();

        // Closing the command channel makes the engine drain the queue
        // and exit; the final published state must be all-off.
        drop(cmd_tx);
        tokio::time::timeout(Duration::from_secs(1), engine)
            .await
            .expect("engine exits")
            .unwrap();
        assert_eq!(*session_rx.borrow(), ClassSessionState::default());
    }

    #[test]
    fn session_tracks_release_independently() {
        let mut session = MediaSession {
            camera: Some(camera::CameraHandle::dummy()),
            microphone: Some(microphone::MicrophoneHandle::dummy()),
            screen: None,
            camera_enabled: true,
            mic_enabled: true,
            screen_sharing: false,
        };

        // Disabling the camera preserves the live microphone track.
        assert!(session.disable_camera());
        assert!(session.camera.is_none());
        assert!(!session.camera_enabled);
        assert!(session.microphone.is_some());
        assert!(session.mic_enabled);

        // Second disable is a no-op.
        assert!(!session.disable_camera());
        assert!(session.mic_enabled);

        assert!(session.disable_microphone());
        assert!(session.microphone.is_none());
    }

    #[test]
    fn shutdown_releases_handles_even_with_stale_flags() {
        let mut session = MediaSession {
            camera: Some(camera::CameraHandle::dummy()),
            microphone: None,
            screen: Some(screen::ScreenCaptureHandle::dummy()),
            // Flags deliberately out of sync with the held handles.
            camera_enabled: false,
            mic_enabled: true,
            screen_sharing: false,
        };

        session.shutdown();
        assert!(session.camera.is_none());
        assert!(session.screen.is_none());
        assert!(!session.mic_enabled);
    }

    #[tokio::test]
    async fn enable_reply_surfaces_acquisition_result() {
        let (cmd_tx, _session_rx, engine) = spawn_engine();

        // No camera hardware in the test environment: the reply must
        // carry a distinguishable error and the state must stay off.
        let (reply, reply_rx) = oneshot::channel();
        cmd_tx
            .send(MediaCommand::EnableCamera {
                device_index: Some(250),
                reply,
            })
            .await
            .unwrap();

        match tokio::time::timeout(Duration::from_secs(10), reply_rx).await {
            Ok(Ok(Err(_media_error))) => {}
            Ok(Ok(Ok(()))) => {
                // A camera actually exists on this machine; turn it off
                // again so the engine tears down cleanly.
                cmd_tx.send(MediaCommand::DisableCamera).await.unwrap();
            }
            other => panic!("unexpected reply: {:?}", other.map(|r| r.is_ok())),
        }

        drop(cmd_tx);
        tokio::time::timeout(Duration::from_secs(5), engine)
            .await
            .expect("engine exits")
            .unwrap();
    }
}
