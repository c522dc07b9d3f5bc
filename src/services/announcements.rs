use crate::catalog::{ListCriteria, Page};
use crate::models::Announcement;
use crate::state::ServiceContext;

pub fn list(ctx: &ServiceContext, criteria: &ListCriteria) -> Page<Announcement> {
    ctx.catalog.announcements_view(criteria)
}

pub fn set_read(ctx: &ServiceContext, id: &str, read: bool) -> Result<(), String> {
    ctx.catalog.set_announcement_read(id, read)
}

/// Returns the new starred state.
pub fn toggle_star(ctx: &ServiceContext, id: &str) -> Result<bool, String> {
    ctx.catalog.toggle_announcement_star(id)
}

pub fn mark_all_read(ctx: &ServiceContext) {
    ctx.catalog.mark_all_announcements_read();
}

pub fn unread_count(ctx: &ServiceContext) -> usize {
    ctx.catalog.unread_announcements()
}
