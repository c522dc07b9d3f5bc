use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::engagement::EngagementSnapshot;
use crate::media::ClassSessionState;
use crate::services;
use crate::state::ServiceContext;

pub async fn get_session_state(State(ctx): State<ServiceContext>) -> Json<ClassSessionState> {
    Json(services::classroom::session_state(&ctx))
}

pub async fn get_engagement(State(ctx): State<ServiceContext>) -> Json<EngagementSnapshot> {
    Json(services::classroom::engagement_snapshot(&ctx))
}

#[derive(Deserialize, Default)]
pub struct EnableCameraRequest {
    pub device_index: Option<u32>,
}

pub async fn enable_camera(
    State(ctx): State<ServiceContext>,
    Json(body): Json<EnableCameraRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::enable_camera(&ctx, body.device_index)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn disable_camera(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::disable_camera(&ctx)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn list_cameras() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "cameras": services::classroom::list_cameras() }))
}

pub async fn enable_microphone(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::enable_microphone(&ctx)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn disable_microphone(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::disable_microphone(&ctx)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn list_microphones() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "microphones": services::classroom::list_microphones() }))
}

pub async fn start_screen_share(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::start_screen_share(&ctx)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn stop_screen_share(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::stop_screen_share(&ctx)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn leave_session(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::classroom::leave_session(&ctx)
        .await
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}
