use tauri::State;

use crate::catalog::{ListCriteria, Page};
use crate::models::Assignment;
use crate::services;
use crate::state::AppState;

#[tauri::command]
pub async fn list_assignments(
    state: State<'_, AppState>,
    criteria: Option<ListCriteria>,
) -> Result<Page<Assignment>, String> {
    Ok(services::assignments::list(
        &state.ctx,
        &criteria.unwrap_or_default(),
    ))
}

#[tauri::command]
pub async fn toggle_assignment_star(
    state: State<'_, AppState>,
    id: String,
) -> Result<bool, String> {
    services::assignments::toggle_star(&state.ctx, &id)
}

#[tauri::command]
pub async fn submit_assignment(
    state: State<'_, AppState>,
    id: String,
) -> Result<Assignment, String> {
    services::assignments::submit(&state.ctx, &id)
}
