use serde::Serialize;
use tokio::sync::broadcast;

use crate::engagement::EngagementSample;
use crate::media::ClassSessionState;

/// Transport-agnostic application events.
/// Emitted by the media engine and engagement poller, consumed by the
/// Tauri bridge and the WebSocket API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum AppEvent {
    /// Media session snapshot changed (camera/mic/screen toggled).
    SessionStateChanged(ClassSessionState),
    /// A new engagement sample was published.
    EngagementUpdated(EngagementSample),
    /// The screen capture pipeline ended outside the app's own controls.
    ScreenShareEnded,
    /// Voice activity flipped on the local microphone.
    SpeakingChanged { speaking: bool },
}

pub type EventSender = broadcast::Sender<AppEvent>;
pub type EventReceiver = broadcast::Receiver<AppEvent>;

pub fn create_event_bus() -> (EventSender, EventReceiver) {
    broadcast::channel(256)
}
