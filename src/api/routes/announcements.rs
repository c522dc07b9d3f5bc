use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::catalog::{ListCriteria, Page, SortDirection};
use crate::models::Announcement;
use crate::services;
use crate::state::ServiceContext;

#[derive(Deserialize)]
pub struct AnnouncementListQuery {
    pub search: Option<String>,
    pub course: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    /// "true" narrows to unread-only when set to "false", etc.
    pub read: Option<String>,
    pub starred: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl AnnouncementListQuery {
    fn into_criteria(self) -> ListCriteria {
        let mut criteria = ListCriteria::default()
            .with_search(self.search.as_deref().unwrap_or(""))
            .sorted_by(
                self.sort.as_deref().unwrap_or("date"),
                self.dir.unwrap_or(SortDirection::Desc),
            );
        for (field, value) in [
            ("course", self.course),
            ("category", self.category),
            ("priority", self.priority),
            ("read", self.read),
            ("starred", self.starred),
        ] {
            if let Some(value) = value {
                criteria = criteria.with_filter(field, &value);
            }
        }
        criteria.page = self.page.unwrap_or(1);
        if let Some(page_size) = self.page_size {
            criteria.page_size = page_size;
        }
        criteria
    }
}

pub async fn list(
    State(ctx): State<ServiceContext>,
    Query(params): Query<AnnouncementListQuery>,
) -> Json<Page<Announcement>> {
    Json(services::announcements::list(&ctx, &params.into_criteria()))
}

#[derive(Deserialize)]
pub struct SetReadRequest {
    pub read: bool,
}

pub async fn set_read(
    State(ctx): State<ServiceContext>,
    Path(id): Path<String>,
    Json(body): Json<SetReadRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::announcements::set_read(&ctx, &id, body.read)
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::NOT_FOUND, e))
}

pub async fn toggle_star(
    State(ctx): State<ServiceContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::announcements::toggle_star(&ctx, &id)
        .map(|starred| Json(serde_json::json!({"starred": starred})))
        .map_err(|e| (StatusCode::NOT_FOUND, e))
}

pub async fn mark_all_read(State(ctx): State<ServiceContext>) -> Json<serde_json::Value> {
    services::announcements::mark_all_read(&ctx);
    Json(serde_json::json!({"unread": services::announcements::unread_count(&ctx)}))
}
