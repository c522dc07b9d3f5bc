pub mod announcements;
pub mod assignments;
pub mod classroom;
pub mod discussions;
pub mod schedule;
pub mod settings;
