use tauri::State;

use crate::catalog::store::NewDiscussion;
use crate::catalog::{ListCriteria, Page};
use crate::models::Discussion;
use crate::services;
use crate::state::AppState;

#[tauri::command]
pub async fn list_discussions(
    state: State<'_, AppState>,
    criteria: Option<ListCriteria>,
) -> Result<Page<Discussion>, String> {
    Ok(services::discussions::list(
        &state.ctx,
        &criteria.unwrap_or_default(),
    ))
}

#[tauri::command]
pub async fn create_discussion(
    state: State<'_, AppState>,
    discussion: NewDiscussion,
) -> Result<Discussion, String> {
    services::discussions::create(&state.ctx, discussion)
}

#[tauri::command]
pub async fn toggle_discussion_like(
    state: State<'_, AppState>,
    id: String,
) -> Result<u32, String> {
    services::discussions::toggle_like(&state.ctx, &id)
}

#[tauri::command]
pub async fn resolve_discussion(state: State<'_, AppState>, id: String) -> Result<(), String> {
    services::discussions::resolve(&state.ctx, &id)
}
