use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::catalog::{ListCriteria, Page, SortDirection};
use crate::models::Assignment;
use crate::services;
use crate::state::ServiceContext;

#[derive(Deserialize)]
pub struct AssignmentListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub course: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl AssignmentListQuery {
    fn into_criteria(self) -> ListCriteria {
        let mut criteria = ListCriteria::default()
            .with_search(self.search.as_deref().unwrap_or(""))
            .sorted_by(
                self.sort.as_deref().unwrap_or("due_date"),
                self.dir.unwrap_or_default(),
            );
        for (field, value) in [
            ("status", self.status),
            ("course", self.course),
            ("priority", self.priority),
            ("category", self.category),
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
    Query(params): Query<AssignmentListQuery>,
) -> Json<Page<Assignment>> {
    Json(services::assignments::list(&ctx, &params.into_criteria()))
}

pub async fn toggle_star(
    State(ctx): State<ServiceContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    services::assignments::toggle_star(&ctx, &id)
        .map(|starred| Json(serde_json::json!({"starred": starred})))
        .map_err(|e| (StatusCode::NOT_FOUND, e))
}

pub async fn submit(
    State(ctx): State<ServiceContext>,
    Path(id): Path<String>,
) -> Result<Json<Assignment>, (StatusCode, String)> {
    services::assignments::submit(&ctx, &id)
        .map(Json)
        .map_err(|e| (StatusCode::CONFLICT, e))
}
