use tauri::State;

use crate::catalog::{ListCriteria, Page};
use crate::models::ScheduleEvent;
use crate::services;
use crate::state::AppState;

#[tauri::command]
pub async fn list_schedule(
    state: State<'_, AppState>,
    criteria: Option<ListCriteria>,
) -> Result<Page<ScheduleEvent>, String> {
    Ok(services::schedule::list(
        &state.ctx,
        &criteria.unwrap_or_default(),
    ))
}
