use crate::catalog::{ListCriteria, Page};
use crate::models::ScheduleEvent;
use crate::state::ServiceContext;

pub fn list(ctx: &ServiceContext, criteria: &ListCriteria) -> Page<ScheduleEvent> {
    ctx.catalog.schedule_view(criteria)
}
