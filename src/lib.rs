mod api;
mod catalog;
mod commands;
mod db;
pub mod engagement;
pub mod events;
pub mod media;
mod models;
mod services;
mod state;

use std::sync::Arc;

use chrono::Local;
use directories::ProjectDirs;
use tauri::{Emitter, Manager};
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::catalog::store::CatalogStore;
use crate::db::Database;
use crate::engagement::client::{AnalyzerApi, AnalyzerClient};
use crate::engagement::EngagementFeed;
use crate::events::{create_event_bus, AppEvent};
use crate::media::frame_server::{PreviewState, VideoSink};
use crate::media::{ClassSessionState, MediaCommand};
use crate::state::{AppState, ServiceContext};

/// Engagement analyzer API root (external service, not part of this app).
pub const DEFAULT_ANALYZER_URL: &str = "http://127.0.0.1:5000/api";

fn get_data_dir(custom_dir: Option<&str>) -> std::path::PathBuf {
    if let Some(dir) = custom_dir {
        std::path::PathBuf::from(dir)
    } else {
        ProjectDirs::from("com", "corementis", "CoreMentis")
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::current_dir().unwrap().join(".corementis"))
    }
}

/// Create a ServiceContext with all shared state.
fn create_service_context(
    data_dir: Option<&str>,
    analyzer_url: &str,
) -> (
    ServiceContext,
    mpsc::Receiver<MediaCommand>,
    watch::Sender<ClassSessionState>,
    Arc<dyn AnalyzerApi>,
) {
    let data_dir = get_data_dir(data_dir);
    info!("Data directory: {:?}", data_dir);

    let db = Arc::new(Database::new(&data_dir).expect("Failed to initialize database"));
    let catalog = CatalogStore::seeded(Local::now().date_naive());

    let (media_tx, media_rx) = mpsc::channel::<MediaCommand>(64);
    let (event_tx, _event_rx) = create_event_bus();
    let (session_tx, session_rx) = watch::channel(ClassSessionState::default());
    let engagement = EngagementFeed::new();
    let analyzer: Arc<dyn AnalyzerApi> = Arc::new(AnalyzerClient::new(analyzer_url));
    info!("Engagement analyzer endpoint: {}", analyzer_url);

    let ctx = ServiceContext {
        db,
        catalog,
        media_tx,
        session_rx,
        engagement,
        event_tx,
    };

    (ctx, media_rx, session_tx, analyzer)
}

/// Spawn the media engine event loop (camera/mic/screen + engagement).
/// Uses tauri::async_runtime::spawn in GUI mode (Tauri manages the runtime).
fn spawn_media_engine(
    media_rx: mpsc::Receiver<MediaCommand>,
    session_tx: watch::Sender<ClassSessionState>,
    preview: PreviewState,
    sink: VideoSink,
    analyzer: Arc<dyn AnalyzerApi>,
    ctx: &ServiceContext,
) {
    let event_tx = ctx.event_tx.clone();
    let feed = ctx.engagement.clone();

    tauri::async_runtime::spawn(async move {
        media::engine::run_media_engine(
            media_rx, session_tx, event_tx, preview, sink, analyzer, feed,
        )
        .await;
    });
}

/// Spawn a bridge that forwards AppEvents to Tauri events for the GUI frontend.
fn spawn_tauri_event_bridge(app_handle: tauri::AppHandle, ctx: &ServiceContext) {
    let mut event_rx = ctx.event_tx.subscribe();

    tauri::async_runtime::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let result = match &event {
                        AppEvent::SessionStateChanged(session) => {
                            app_handle.emit("session-state-changed", session)
                        }
                        AppEvent::EngagementUpdated(sample) => {
                            app_handle.emit("engagement-updated", sample)
                        }
                        AppEvent::ScreenShareEnded => {
                            app_handle.emit("screen-share-ended", serde_json::json!({}))
                        }
                        AppEvent::SpeakingChanged { speaking } => app_handle.emit(
                            "speaking-changed",
                            serde_json::json!({ "speaking": speaking }),
                        ),
                    };
                    if let Err(e) = result {
                        tracing::warn!("Failed to emit Tauri event: {}", e);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Tauri event bridge lagged, skipped {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    });
}

/// Run the GUI application (Tauri + API server).
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    run_with_opts(None, 9851, DEFAULT_ANALYZER_URL);
}

pub fn run_with_opts(data_dir: Option<&str>, api_port: u16, analyzer_url: &str) {
    tracing_subscriber::fmt::init();

    // Owned copies for the move closure
    let data_dir_owned = data_dir.map(|s| s.to_string());
    let analyzer_url_owned = analyzer_url.to_string();

    tauri::Builder::default()
        .setup(move |app| {
            let app_handle = app.handle().clone();

            let (ctx, media_rx, session_tx, analyzer) =
                create_service_context(data_dir_owned.as_deref(), &analyzer_url_owned);

            // Manage Tauri state
            app.manage(AppState {
                ctx: ctx.clone(),
                api_port,
            });

            // Local preview + sampler sink (shared between media engine and API)
            let preview = PreviewState::new();
            let sink = VideoSink::new();

            spawn_media_engine(
                media_rx,
                session_tx,
                preview.clone(),
                sink,
                analyzer,
                &ctx,
            );

            spawn_tauri_event_bridge(app_handle, &ctx);

            // Spawn API server (with preview routes)
            let api_ctx = ctx.clone();
            tauri::async_runtime::spawn(async move {
                api::server::start_api_server(api_ctx, api_port, preview).await;
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::classroom::get_api_port,
            commands::classroom::get_session_state,
            commands::classroom::get_engagement,
            commands::classroom::enable_camera,
            commands::classroom::disable_camera,
            commands::classroom::list_cameras,
            commands::classroom::enable_microphone,
            commands::classroom::disable_microphone,
            commands::classroom::list_microphones,
            commands::classroom::start_screen_share,
            commands::classroom::stop_screen_share,
            commands::classroom::leave_classroom,
            commands::assignments::list_assignments,
            commands::assignments::toggle_assignment_star,
            commands::assignments::submit_assignment,
            commands::announcements::list_announcements,
            commands::announcements::set_announcement_read,
            commands::announcements::toggle_announcement_star,
            commands::announcements::mark_all_announcements_read,
            commands::discussions::list_discussions,
            commands::discussions::create_discussion,
            commands::discussions::toggle_discussion_like,
            commands::discussions::resolve_discussion,
            commands::schedule::list_schedule,
            commands::settings::get_setting,
            commands::settings::set_setting,
            commands::settings::get_all_settings,
            commands::settings::delete_setting,
            commands::settings::get_profile,
            commands::settings::update_profile,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Run in headless mode (no GUI, API server only).
/// Uses tokio::spawn directly since headless mode runs on its own tokio runtime.
pub async fn run_headless(data_dir: Option<&str>, api_port: u16, analyzer_url: &str) {
    tracing_subscriber::fmt::init();

    let (ctx, media_rx, session_tx, analyzer) = create_service_context(data_dir, analyzer_url);

    let preview = PreviewState::new();
    let sink = VideoSink::new();

    let engine_event_tx = ctx.event_tx.clone();
    let engine_feed = ctx.engagement.clone();
    let engine_preview = preview.clone();
    tokio::spawn(async move {
        media::engine::run_media_engine(
            media_rx,
            session_tx,
            engine_event_tx,
            engine_preview,
            sink,
            analyzer,
            engine_feed,
        )
        .await;
    });

    info!("Running in headless mode");

    // Run API server (blocks until shutdown)
    api::server::start_api_server(ctx, api_port, preview).await;
}
