use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::{routes, websocket};
use crate::media::frame_server::{self, PreviewState};
use crate::state::ServiceContext;

pub fn build_router(ctx: ServiceContext, preview: PreviewState) -> Router {
    Router::new()
        // Assignments
        .route("/api/v1/assignments", get(routes::assignments::list))
        .route("/api/v1/assignments/:id/star", post(routes::assignments::toggle_star))
        .route("/api/v1/assignments/:id/submit", post(routes::assignments::submit))
        // Announcements
        .route("/api/v1/announcements", get(routes::announcements::list))
        .route("/api/v1/announcements/read-all", post(routes::announcements::mark_all_read))
        .route("/api/v1/announcements/:id/read", put(routes::announcements::set_read))
        .route("/api/v1/announcements/:id/star", post(routes::announcements::toggle_star))
        // Discussions
        .route(
            "/api/v1/discussions",
            get(routes::discussions::list).post(routes::discussions::create),
        )
        .route("/api/v1/discussions/:id/like", post(routes::discussions::toggle_like))
        .route("/api/v1/discussions/:id/resolve", post(routes::discussions::resolve))
        // Schedule
        .route("/api/v1/schedule", get(routes::schedule::list))
        // Classroom (media engine)
        .route("/api/v1/classroom/session", get(routes::classroom::get_session_state))
        .route("/api/v1/classroom/engagement", get(routes::classroom::get_engagement))
        .route("/api/v1/classroom/camera/enable", post(routes::classroom::enable_camera))
        .route("/api/v1/classroom/camera/disable", post(routes::classroom::disable_camera))
        .route("/api/v1/classroom/cameras", get(routes::classroom::list_cameras))
        .route("/api/v1/classroom/microphone/enable", post(routes::classroom::enable_microphone))
        .route("/api/v1/classroom/microphone/disable", post(routes::classroom::disable_microphone))
        .route("/api/v1/classroom/microphones", get(routes::classroom::list_microphones))
        .route("/api/v1/classroom/screen/start", post(routes::classroom::start_screen_share))
        .route("/api/v1/classroom/screen/stop", post(routes::classroom::stop_screen_share))
        .route("/api/v1/classroom/leave", post(routes::classroom::leave_session))
        // Settings & profile
        .route("/api/v1/settings", get(routes::settings::get_all_settings))
        .route(
            "/api/v1/settings/:key",
            get(routes::settings::get_setting)
                .put(routes::settings::set_setting)
                .delete(routes::settings::delete_setting),
        )
        .route(
            "/api/v1/profile",
            get(routes::settings::get_profile).put(routes::settings::update_profile),
        )
        // WebSocket event stream
        .route("/ws", get(websocket::ws_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .with_state(ctx)
        // Merge local preview routes (MJPEG streams)
        .merge(frame_server::preview_routes(preview))
}

pub async fn start_api_server(ctx: ServiceContext, port: u16, preview: PreviewState) {
    let router = build_router(ctx, preview);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind API server");
    info!("API server listening on http://{}", addr);
    axum::serve(listener, router)
        .await
        .expect("API server error");
}
