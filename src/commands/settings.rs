use tauri::State;

use crate::models::{Setting, StudentProfile};
use crate::services;
use crate::state::AppState;

#[tauri::command]
pub async fn get_setting(
    state: State<'_, AppState>,
    key: String,
) -> Result<Option<String>, String> {
    services::settings::get_setting(&state.ctx, &key)
}

#[tauri::command]
pub async fn set_setting(
    state: State<'_, AppState>,
    key: String,
    value: String,
) -> Result<(), String> {
    services::settings::set_setting(&state.ctx, &key, &value)
}

#[tauri::command]
pub async fn get_all_settings(state: State<'_, AppState>) -> Result<Vec<Setting>, String> {
    services::settings::get_all_settings(&state.ctx)
}

#[tauri::command]
pub async fn delete_setting(state: State<'_, AppState>, key: String) -> Result<(), String> {
    services::settings::delete_setting(&state.ctx, &key)
}

#[tauri::command]
pub async fn get_profile(state: State<'_, AppState>) -> Result<StudentProfile, String> {
    services::profile::get(&state.ctx)
}

#[tauri::command]
pub async fn update_profile(
    state: State<'_, AppState>,
    profile: StudentProfile,
) -> Result<(), String> {
    services::profile::update(&state.ctx, &profile)
}
