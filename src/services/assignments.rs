use chrono::Local;

use crate::catalog::{ListCriteria, Page};
use crate::models::Assignment;
use crate::state::ServiceContext;

pub fn list(ctx: &ServiceContext, criteria: &ListCriteria) -> Page<Assignment> {
    // Re-derive overdue status against the current date before serving.
    ctx.catalog.refresh_overdue(Local::now().date_naive());
    ctx.catalog.assignments_view(criteria)
}

/// Returns the new starred state.
pub fn toggle_star(ctx: &ServiceContext, id: &str) -> Result<bool, String> {
    ctx.catalog.toggle_assignment_star(id)
}

pub fn submit(ctx: &ServiceContext, id: &str) -> Result<Assignment, String> {
    ctx.catalog.submit_assignment(id, Local::now().date_naive())
}
