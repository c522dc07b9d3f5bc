use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::catalog::{ListCriteria, Page, SortDirection};
use crate::models::ScheduleEvent;
use crate::services;
use crate::state::ServiceContext;

#[derive(Deserialize)]
pub struct ScheduleListQuery {
    pub search: Option<String>,
    pub day: Option<String>,
    pub course: Option<String>,
    pub event_type: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ScheduleListQuery {
    fn into_criteria(self) -> ListCriteria {
        let mut criteria = ListCriteria::default()
            .with_search(self.search.as_deref().unwrap_or(""))
            .sorted_by("start_time", SortDirection::Asc)
            // A week of events fits on one page.
            .on_page(self.page.unwrap_or(1), self.page_size.unwrap_or(50));
        for (field, value) in [
            ("day", self.day),
            ("course", self.course),
            ("event_type", self.event_type),
        ] {
            if let Some(value) = value {
                criteria = criteria.with_filter(field, &value);
            }
        }
        criteria
    }
}

pub async fn list(
    State(ctx): State<ServiceContext>,
    Query(params): Query<ScheduleListQuery>,
) -> Json<Page<ScheduleEvent>> {
    Json(services::schedule::list(&ctx, &params.into_criteria()))
}
