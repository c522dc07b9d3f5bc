pub mod camera;
pub mod engine;
pub mod frame_server;
pub mod microphone;
pub mod screen;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Why a capture device could not be acquired. Reported to the caller,
/// never retried automatically; the enabled flag is left unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "reason")]
pub enum MediaError {
    PermissionDenied(String),
    DeviceNotFound(String),
    DeviceBusy(String),
    CaptureFailed(String),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::PermissionDenied(reason) => write!(f, "Permission denied: {}", reason),
            MediaError::DeviceNotFound(reason) => write!(f, "Device not found: {}", reason),
            MediaError::DeviceBusy(reason) => write!(f, "Device busy: {}", reason),
            MediaError::CaptureFailed(reason) => write!(f, "Capture failed: {}", reason),
        }
    }
}

impl std::error::Error for MediaError {}

impl MediaError {
    /// Classify a backend error string from the OS capture layer.
    pub fn classify(raw: String) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
            MediaError::PermissionDenied(raw)
        } else if lower.contains("not found") || lower.contains("no device") || lower.contains("no input device") {
            MediaError::DeviceNotFound(raw)
        } else if lower.contains("busy") || lower.contains("in use") {
            MediaError::DeviceBusy(raw)
        } else {
            MediaError::CaptureFailed(raw)
        }
    }
}

pub type AcquisitionReply = oneshot::Sender<Result<(), MediaError>>;

/// Commands sent to the media engine from Tauri commands / API routes.
/// Enable variants carry a reply channel so acquisition failures reach
/// the caller as a distinguishable error.
#[derive(Debug)]
pub enum MediaCommand {
    EnableCamera {
        device_index: Option<u32>,
        reply: AcquisitionReply,
    },
    DisableCamera,
    EnableMicrophone {
        reply: AcquisitionReply,
    },
    DisableMicrophone,
    StartScreenShare {
        reply: AcquisitionReply,
    },
    StopScreenShare,
    /// Leave the classroom: release every held capture handle.
    LeaveSession,
}

/// Current media session snapshot returned by GET /classroom/session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSessionState {
    pub camera_enabled: bool,
    pub mic_enabled: bool,
    pub screen_sharing: bool,
    /// Engagement polling loop active.
    pub analyzing: bool,
    /// Local voice activity.
    pub speaking: bool,
}

impl Default for ClassSessionState {
    fn default() -> Self {
        Self {
            camera_enabled: false,
            mic_enabled: false,
            screen_sharing: false,
            analyzing: false,
            speaking: false,
        }
    }
}
