use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::catalog::store::CatalogStore;
use crate::db::Database;
use crate::engagement::EngagementFeed;
use crate::events::EventSender;
use crate::media::{ClassSessionState, MediaCommand};

/// Transport-agnostic context shared by services, API routes, and Tauri
/// commands.
#[derive(Clone)]
pub struct ServiceContext {
    pub db: Arc<Database>,
    pub catalog: CatalogStore,
    pub media_tx: mpsc::Sender<MediaCommand>,
    pub session_rx: watch::Receiver<ClassSessionState>,
    pub engagement: EngagementFeed,
    pub event_tx: EventSender,
}

/// Tauri-managed state that wraps ServiceContext.
pub struct AppState {
    pub ctx: ServiceContext,
    pub api_port: u16,
}
