use tauri::State;

use crate::catalog::{ListCriteria, Page};
use crate::models::Announcement;
use crate::services;
use crate::state::AppState;

#[tauri::command]
pub async fn list_announcements(
    state: State<'_, AppState>,
    criteria: Option<ListCriteria>,
) -> Result<Page<Announcement>, String> {
    Ok(services::announcements::list(
        &state.ctx,
        &criteria.unwrap_or_default(),
    ))
}

#[tauri::command]
pub async fn set_announcement_read(
    state: State<'_, AppState>,
    id: String,
    read: bool,
) -> Result<(), String> {
    services::announcements::set_read(&state.ctx, &id, read)
}

#[tauri::command]
pub async fn toggle_announcement_star(
    state: State<'_, AppState>,
    id: String,
) -> Result<bool, String> {
    services::announcements::toggle_star(&state.ctx, &id)
}

#[tauri::command]
pub async fn mark_all_announcements_read(state: State<'_, AppState>) -> Result<usize, String> {
    services::announcements::mark_all_read(&state.ctx);
    Ok(services::announcements::unread_count(&state.ctx))
}
