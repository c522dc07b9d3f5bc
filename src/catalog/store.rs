use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Announcement, Assignment, AssignmentStatus, Discussion, ScheduleEvent,
};

use super::{derive_view, seed, ListCriteria, Page};

/// In-memory course catalog shared by services, API routes, and Tauri
/// commands. Collections are session-scoped: seeded at startup, mutated
/// only through the by-id item actions below, never persisted.
#[derive(Clone)]
pub struct CatalogStore {
    assignments: Arc<RwLock<Vec<Assignment>>>,
    announcements: Arc<RwLock<Vec<Announcement>>>,
    discussions: Arc<RwLock<Vec<Discussion>>>,
    schedule: Arc<RwLock<Vec<ScheduleEvent>>>,
}

/// Input for posting a new discussion thread.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewDiscussion {
    pub title: String,
    pub course: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogStore {
    pub fn seeded(today: NaiveDate) -> Self {
        let store = Self {
            assignments: Arc::new(RwLock::new(seed::assignments(today))),
            announcements: Arc::new(RwLock::new(seed::announcements(today))),
            discussions: Arc::new(RwLock::new(seed::discussions(today))),
            schedule: Arc::new(RwLock::new(seed::schedule())),
        };
        store.refresh_overdue(today);
        store
    }

    // --- Derived views ---

    pub fn assignments_view(&self, criteria: &ListCriteria) -> Page<Assignment> {
        derive_view(&self.assignments.read().unwrap(), criteria)
    }

    pub fn announcements_view(&self, criteria: &ListCriteria) -> Page<Announcement> {
        derive_view(&self.announcements.read().unwrap(), criteria)
    }

    pub fn discussions_view(&self, criteria: &ListCriteria) -> Page<Discussion> {
        derive_view(&self.discussions.read().unwrap(), criteria)
    }

    pub fn schedule_view(&self, criteria: &ListCriteria) -> Page<ScheduleEvent> {
        derive_view(&self.schedule.read().unwrap(), criteria)
    }

    // --- Assignments ---

    /// Flip a pending assignment past its due date to overdue.
    pub fn refresh_overdue(&self, today: NaiveDate) {
        let mut assignments = self.assignments.write().unwrap();
        for a in assignments.iter_mut() {
            if a.status == AssignmentStatus::Pending && a.due_date < today {
                a.status = AssignmentStatus::Overdue;
            }
        }
    }

    /// Returns the new starred state.
    pub fn toggle_assignment_star(&self, id: &str) -> Result<bool, String> {
        let mut assignments = self.assignments.write().unwrap();
        let a = assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| format!("Unknown assignment: {}", id))?;
        a.starred = !a.starred;
        Ok(a.starred)
    }

    pub fn submit_assignment(&self, id: &str, today: NaiveDate) -> Result<Assignment, String> {
        let mut assignments = self.assignments.write().unwrap();
        let a = assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| format!("Unknown assignment: {}", id))?;
        match a.status {
            AssignmentStatus::Completed | AssignmentStatus::Submitted => {
                return Err(format!("Assignment already submitted: {}", a.title));
            }
            AssignmentStatus::Pending | AssignmentStatus::Overdue => {}
        }
        a.status = AssignmentStatus::Submitted;
        a.submitted_date = Some(today);
        Ok(a.clone())
    }

    // --- Announcements ---

    pub fn set_announcement_read(&self, id: &str, read: bool) -> Result<(), String> {
        let mut announcements = self.announcements.write().unwrap();
        let a = announcements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| format!("Unknown announcement: {}", id))?;
        a.read = read;
        Ok(())
    }

    /// Returns the new starred state.
    pub fn toggle_announcement_star(&self, id: &str) -> Result<bool, String> {
        let mut announcements = self.announcements.write().unwrap();
        let a = announcements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| format!("Unknown announcement: {}", id))?;
        a.starred = !a.starred;
        Ok(a.starred)
    }

    pub fn mark_all_announcements_read(&self) {
        let mut announcements = self.announcements.write().unwrap();
        for a in announcements.iter_mut() {
            a.read = true;
        }
    }

    pub fn unread_announcements(&self) -> usize {
        self.announcements
            .read()
            .unwrap()
            .iter()
            .filter(|a| !a.read)
            .count()
    }

    // --- Discussions ---

    pub fn create_discussion(
        &self,
        new: NewDiscussion,
        author: &str,
        today: NaiveDate,
    ) -> Discussion {
        let discussion = Discussion {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            course: new.course,
            author: author.to_string(),
            created_at: today,
            last_activity: today,
            content: new.content,
            tags: new.tags,
            replies: 0,
            likes: 0,
            liked_by_me: false,
            resolved: false,
        };
        self.discussions
            .write()
            .unwrap()
            .insert(0, discussion.clone());
        discussion
    }

    /// Returns the new like count.
    pub fn toggle_discussion_like(&self, id: &str) -> Result<u32, String> {
        let mut discussions = self.discussions.write().unwrap();
        let d = discussions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| format!("Unknown discussion: {}", id))?;
        if d.liked_by_me {
            d.likes = d.likes.saturating_sub(1);
        } else {
            d.likes += 1;
        }
        d.liked_by_me = !d.liked_by_me;
        Ok(d.likes)
    }

    pub fn resolve_discussion(&self, id: &str) -> Result<(), String> {
        let mut discussions = self.discussions.write().unwrap();
        let d = discussions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| format!("Unknown discussion: {}", id))?;
        d.resolved = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SortDirection;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 12).unwrap()
    }

    #[test]
    fn item_mutations_are_reflected_without_reordering() {
        let store = CatalogStore::seeded(today());
        let criteria = ListCriteria::default().on_page(1, 50);

        let before = store.assignments_view(&criteria);
        let target = before.items[2].id.clone();
        let was_starred = before.items[2].starred;

        store.toggle_assignment_star(&target).unwrap();

        let after = store.assignments_view(&criteria);
        let order_before: Vec<&String> = before.items.iter().map(|a| &a.id).collect();
        let order_after: Vec<&String> = after.items.iter().map(|a| &a.id).collect();
        assert_eq!(order_before, order_after);
        assert_eq!(after.items[2].starred, !was_starred);
    }

    #[test]
    fn submit_sets_status_and_date() {
        let store = CatalogStore::seeded(today());
        let criteria = ListCriteria::default()
            .with_filter("status", "pending")
            .on_page(1, 1);
        let pending = store.assignments_view(&criteria);
        let id = pending.items[0].id.clone();

        let submitted = store.submit_assignment(&id, today()).unwrap();
        assert_eq!(submitted.status, AssignmentStatus::Submitted);
        assert_eq!(submitted.submitted_date, Some(today()));

        assert!(store.submit_assignment(&id, today()).is_err());
    }

    #[test]
    fn overdue_is_derived_from_due_date() {
        let store = CatalogStore::seeded(today());
        let overdue = store.assignments_view(
            &ListCriteria::default()
                .with_filter("status", "overdue")
                .on_page(1, 50),
        );
        assert!(!overdue.items.is_empty());
        assert!(overdue.items.iter().all(|a| a.due_date < today()));
    }

    #[test]
    fn like_toggle_round_trips() {
        let store = CatalogStore::seeded(today());
        let view = store.discussions_view(&ListCriteria::default().on_page(1, 1));
        let d = &view.items[0];
        let baseline = d.likes;

        let liked = store.toggle_discussion_like(&d.id).unwrap();
        assert_eq!(liked, baseline + 1);
        let unliked = store.toggle_discussion_like(&d.id).unwrap();
        assert_eq!(unliked, baseline);
    }

    #[test]
    fn mark_all_read_clears_unread_count() {
        let store = CatalogStore::seeded(today());
        assert!(store.unread_announcements() > 0);
        store.mark_all_announcements_read();
        assert_eq!(store.unread_announcements(), 0);
    }

    #[test]
    fn new_discussion_lands_on_top_in_source_order() {
        let store = CatalogStore::seeded(today());
        let created = store.create_discussion(
            NewDiscussion {
                title: "Gradient clipping thresholds".to_string(),
                course: "Deep Learning".to_string(),
                content: "What thresholds work for RNNs?".to_string(),
                tags: vec!["training".to_string()],
            },
            "Alex Kim",
            today(),
        );

        let view = store.discussions_view(&ListCriteria::default().on_page(1, 1));
        assert_eq!(view.items[0].id, created.id);
    }

    #[test]
    fn schedule_filters_by_day() {
        let store = CatalogStore::seeded(today());
        let monday = store.schedule_view(
            &ListCriteria::default()
                .with_filter("day", "Monday")
                .sorted_by("start_time", SortDirection::Asc)
                .on_page(1, 50),
        );
        assert!(!monday.items.is_empty());
        assert!(monday.items.iter().all(|e| e.day == "Monday"));
        let times: Vec<&String> = monday.items.iter().map(|e| &e.start_time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }
}
