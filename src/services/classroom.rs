use tokio::sync::oneshot;

use crate::engagement::EngagementSnapshot;
use crate::media::{camera, microphone, AcquisitionReply, ClassSessionState, MediaCommand};
use crate::state::ServiceContext;

/// Send an acquisition command and wait for the engine's verdict, so
/// permission/device errors reach the caller instead of a log file.
async fn acquire(
    ctx: &ServiceContext,
    build: impl FnOnce(AcquisitionReply) -> MediaCommand,
) -> Result<(), String> {
    let (reply_tx, reply_rx) = oneshot::channel();
    ctx.media_tx
        .send(build(reply_tx))
        .await
        .map_err(|e| format!("Media engine unavailable: {}", e))?;
    match reply_rx.await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("Media engine dropped the request".to_string()),
    }
}

pub async fn enable_camera(
    ctx: &ServiceContext,
    device_index: Option<u32>,
) -> Result<(), String> {
    acquire(ctx, |reply| MediaCommand::EnableCamera {
        device_index,
        reply,
    })
    .await
}

pub async fn disable_camera(ctx: &ServiceContext) -> Result<(), String> {
    ctx.media_tx
        .send(MediaCommand::DisableCamera)
        .await
        .map_err(|e| format!("Failed to disable camera: {}", e))
}

pub async fn enable_microphone(ctx: &ServiceContext) -> Result<(), String> {
    acquire(ctx, |reply| MediaCommand::EnableMicrophone { reply }).await
}

pub async fn disable_microphone(ctx: &ServiceContext) -> Result<(), String> {
    ctx.media_tx
        .send(MediaCommand::DisableMicrophone)
        .await
        .map_err(|e| format!("Failed to disable microphone: {}", e))
}

pub async fn start_screen_share(ctx: &ServiceContext) -> Result<(), String> {
    acquire(ctx, |reply| MediaCommand::StartScreenShare { reply }).await
}

pub async fn stop_screen_share(ctx: &ServiceContext) -> Result<(), String> {
    ctx.media_tx
        .send(MediaCommand::StopScreenShare)
        .await
        .map_err(|e| format!("Failed to stop screen share: {}", e))
}

pub async fn leave_session(ctx: &ServiceContext) -> Result<(), String> {
    ctx.media_tx
        .send(MediaCommand::LeaveSession)
        .await
        .map_err(|e| format!("Failed to leave session: {}", e))
}

pub fn session_state(ctx: &ServiceContext) -> ClassSessionState {
    ctx.session_rx.borrow().clone()
}

pub fn engagement_snapshot(ctx: &ServiceContext) -> EngagementSnapshot {
    ctx.engagement.snapshot()
}

pub fn list_cameras() -> Vec<camera::CameraDevice> {
    camera::list_cameras()
}

pub fn list_microphones() -> Vec<microphone::AudioDevice> {
    microphone::list_devices()
}
