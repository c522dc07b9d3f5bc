use tauri::State;

use crate::engagement::EngagementSnapshot;
use crate::media::{camera, microphone, ClassSessionState};
use crate::services;
use crate::state::AppState;

/// Port of the local HTTP API (preview streams, WebSocket).
#[tauri::command]
pub async fn get_api_port(state: State<'_, AppState>) -> Result<u16, String> {
    Ok(state.api_port)
}

#[tauri::command]
pub async fn get_session_state(state: State<'_, AppState>) -> Result<ClassSessionState, String> {
    Ok(services::classroom::session_state(&state.ctx))
}

#[tauri::command]
pub async fn get_engagement(state: State<'_, AppState>) -> Result<EngagementSnapshot, String> {
    Ok(services::classroom::engagement_snapshot(&state.ctx))
}

/// Enable the camera. Resolves once the device is acquired (or with the
/// acquisition error message).
#[tauri::command]
pub async fn enable_camera(
    state: State<'_, AppState>,
    device_index: Option<u32>,
) -> Result<(), String> {
    services::classroom::enable_camera(&state.ctx, device_index).await
}

#[tauri::command]
pub async fn disable_camera(state: State<'_, AppState>) -> Result<(), String> {
    services::classroom::disable_camera(&state.ctx).await
}

#[tauri::command]
pub async fn list_cameras() -> Result<Vec<camera::CameraDevice>, String> {
    Ok(services::classroom::list_cameras())
}

#[tauri::command]
pub async fn enable_microphone(state: State<'_, AppState>) -> Result<(), String> {
    services::classroom::enable_microphone(&state.ctx).await
}

#[tauri::command]
pub async fn disable_microphone(state: State<'_, AppState>) -> Result<(), String> {
    services::classroom::disable_microphone(&state.ctx).await
}

#[tauri::command]
pub async fn list_microphones() -> Result<Vec<microphone::AudioDevice>, String> {
    Ok(services::classroom::list_microphones())
}

#[tauri::command]
pub async fn start_screen_share(state: State<'_, AppState>) -> Result<(), String> {
    services::classroom::start_screen_share(&state.ctx).await
}

#[tauri::command]
pub async fn stop_screen_share(state: State<'_, AppState>) -> Result<(), String> {
    services::classroom::stop_screen_share(&state.ctx).await
}

#[tauri::command]
pub async fn leave_classroom(state: State<'_, AppState>) -> Result<(), String> {
    services::classroom::leave_session(&state.ctx).await
}
