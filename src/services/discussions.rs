use chrono::Local;

use crate::catalog::store::NewDiscussion;
use crate::catalog::{ListCriteria, Page};
use crate::models::Discussion;
use crate::state::ServiceContext;

pub fn list(ctx: &ServiceContext, criteria: &ListCriteria) -> Page<Discussion> {
    ctx.catalog.discussions_view(criteria)
}

pub fn create(ctx: &ServiceContext, new: NewDiscussion) -> Result<Discussion, String> {
    let author = ctx
        .db
        .get_profile()
        .map(|p| p.display_name)
        .map_err(|e| e.to_string())?;
    Ok(ctx
        .catalog
        .create_discussion(new, &author, Local::now().date_naive()))
}

/// Returns the new like count.
pub fn toggle_like(ctx: &ServiceContext, id: &str) -> Result<u32, String> {
    ctx.catalog.toggle_discussion_like(id)
}

pub fn resolve(ctx: &ServiceContext, id: &str) -> Result<(), String> {
    ctx.catalog.resolve_discussion(id)
}
