use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::catalog::store::NewDiscussion;
use crate::catalog::{ListCriteria, Page, SortDirection};
use crate::models::Discussion;
use crate::services;
use crate::state::ServiceContext;

#[derive(Deserialize)]
pub struct DiscussionListQuery {
    pub search: Option<String>,
    pub course: Option<String>,
    /// "resolved" | "unresolved" | "all"
    pub status: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl DiscussionListQuery {
    fn into_criteria(self) -> ListCriteria {
        let mut criteria = ListCriteria::default()
            .with_search(self.search.as_deref().unwrap_or(""))
            .sorted_by(
                self.sort.as_deref().unwrap_or("last_activity"),
                self.dir.unwrap_or(SortDirection::Desc),
            );
        for (field, value) in [("course", self.course), ("status", self.status)] {
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
    Query(params): Query<DiscussionListQuery>,
) -> Json<Page<Discussion>> {
    Json(services::discussions::list(&ctx, &params.into_criteria()))
}

pub async fn create(
    State(ctx): State<ServiceContext>,
    Json(body): Json<NewDiscussion>,
) -> Result<(StatusCode, Json<Discussion>), (StatusCode, String)> {
    services::discussions::create(&ctx, body)
        .map(|d| (StatusCode::CREATED, Json(d)))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn toggle_like(
    State(ctx): State<ServiceContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::discussions::toggle_like(&ctx, &id)
        .map(|likes| Json(serde_json::json!({"likes": likes})))
        .map_err(|e| (StatusCode::NOT_FOUND, e))
}

pub async fn resolve(
    State(ctx): State<ServiceContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::discussions::resolve(&ctx, &id)
        .map(|_| Json(serde_json::json!({"resolved": true})))
        .map_err(|e| (StatusCode::NOT_FOUND, e))
}
