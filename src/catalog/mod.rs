pub mod seed;
pub mod store;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Announcement, Assignment, Discussion, ScheduleEvent};

/// Sentinel filter value that disables a categorical filter.
pub const FILTER_ALL: &str = "all";

/// Default page size used by every list view.
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Read-only view configuration applied against an in-memory collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCriteria {
    /// Case-insensitive substring match over the item's search fields.
    #[serde(default)]
    pub search: String,
    /// Field name -> accepted value; `"all"` disables that field.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Empty string keeps the source ordering.
    #[serde(default)]
    pub sort_key: String,
    #[serde(default)]
    pub sort_dir: SortDirection,
    /// 1-based, clamped to the derived page count.
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn first_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_key: String::new(),
            sort_dir: SortDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListCriteria {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    pub fn with_filter(mut self, field: &str, value: &str) -> Self {
        self.filters.insert(field.to_string(), value.to_string());
        self
    }

    pub fn sorted_by(mut self, key: &str, dir: SortDirection) -> Self {
        self.sort_key = key.to_string();
        self.sort_dir = dir;
        self
    }

    pub fn on_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

/// One derived page of a filtered, sorted collection.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page_count: usize,
    pub page: usize,
}

/// Collection items a `ListCriteria` can be applied to.
pub trait Queryable {
    /// Case-insensitive substring match against the type's search fields.
    /// `needle` is already lowercased.
    fn matches_search(&self, needle: &str) -> bool;

    /// Exact-equality categorical filter. Unknown fields match everything
    /// so stale criteria never hide the whole collection.
    fn matches_filter(&self, field: &str, value: &str) -> bool;

    /// Comparator for `sort_key`. Unknown keys compare equal, which keeps
    /// the source order under the stable sort.
    fn compare_by(&self, other: &Self, key: &str) -> Ordering;
}

/// Derive the displayed page: AND-filter, stable sort, fixed-size slice.
pub fn derive_view<T: Queryable + Clone>(items: &[T], criteria: &ListCriteria) -> Page<T> {
    let needle = criteria.search.trim().to_lowercase();

    let mut filtered: Vec<&T> = items
        .iter()
        .filter(|item| needle.is_empty() || item.matches_search(&needle))
        .filter(|item| {
            criteria
                .filters
                .iter()
                .filter(|(_, value)| value.as_str() != FILTER_ALL)
                .all(|(field, value)| item.matches_filter(field, value))
        })
        .collect();

    if !criteria.sort_key.is_empty() {
        // sort_by is stable: ties keep the source collection order.
        filtered.sort_by(|a, b| {
            let ord = a.compare_by(b, &criteria.sort_key);
            match criteria.sort_dir {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    let total_count = filtered.len();
    let page_size = criteria.page_size.max(1);
    let page_count = total_count.div_ceil(page_size).max(1);
    let page = criteria.page.clamp(1, page_count);

    let start = (page - 1) * page_size;
    let items = filtered
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        items,
        total_count,
        page_count,
        page,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Queryable for Assignment {
    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.course, needle)
            || contains_ci(&self.instructor, needle)
    }

    fn matches_filter(&self, field: &str, value: &str) -> bool {
        match field {
            "status" => self.status.as_str() == value,
            "course" => self.course == value,
            "priority" => self.priority.as_str() == value,
            "category" => self.category == value,
            "starred" => self.starred.to_string() == value,
            _ => true,
        }
    }

    fn compare_by(&self, other: &Self, key: &str) -> Ordering {
        match key {
            "due_date" => self.due_date.cmp(&other.due_date),
            "title" => self.title.cmp(&other.title),
            "course" => self.course.cmp(&other.course),
            "priority" => self.priority.rank().cmp(&other.priority.rank()),
            "status" => self.status.as_str().cmp(other.status.as_str()),
            "max_score" => self.max_score.cmp(&other.max_score),
            _ => Ordering::Equal,
        }
    }
}

impl Queryable for Announcement {
    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.content, needle)
            || contains_ci(&self.course, needle)
            || contains_ci(&self.author, needle)
    }

    fn matches_filter(&self, field: &str, value: &str) -> bool {
        match field {
            "course" => self.course == value,
            "category" => self.category == value,
            "priority" => self.priority.as_str() == value,
            "read" => self.read.to_string() == value,
            "starred" => self.starred.to_string() == value,
            _ => true,
        }
    }

    fn compare_by(&self, other: &Self, key: &str) -> Ordering {
        match key {
            "date" => self.date.cmp(&other.date),
            "title" => self.title.cmp(&other.title),
            "priority" => self.priority.rank().cmp(&other.priority.rank()),
            _ => Ordering::Equal,
        }
    }
}

impl Queryable for Discussion {
    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.course, needle)
            || contains_ci(&self.author, needle)
            || self.tags.iter().any(|tag| contains_ci(tag, needle))
    }

    fn matches_filter(&self, field: &str, value: &str) -> bool {
        match field {
            "course" => self.course == value,
            "status" => match value {
                "resolved" => self.resolved,
                "unresolved" => !self.resolved,
                _ => true,
            },
            _ => true,
        }
    }

    fn compare_by(&self, other: &Self, key: &str) -> Ordering {
        match key {
            "last_activity" => self.last_activity.cmp(&other.last_activity),
            "created_at" => self.created_at.cmp(&other.created_at),
            "replies" => self.replies.cmp(&other.replies),
            "likes" => self.likes.cmp(&other.likes),
            "title" => self.title.cmp(&other.title),
            _ => Ordering::Equal,
        }
    }
}

impl Queryable for ScheduleEvent {
    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.course, needle)
            || contains_ci(&self.location, needle)
    }

    fn matches_filter(&self, field: &str, value: &str) -> bool {
        match field {
            "day" => self.day == value,
            "course" => self.course == value,
            "event_type" => self.event_type == value,
            _ => true,
        }
    }

    fn compare_by(&self, other: &Self, key: &str) -> Ordering {
        match key {
            "start_time" => self.start_time.cmp(&other.start_time),
            "title" => self.title.cmp(&other.title),
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, Priority};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn assignment(
        id: &str,
        title: &str,
        instructor: &str,
        due: &str,
        status: AssignmentStatus,
        priority: Priority,
    ) -> Assignment {
        Assignment {
            id: id.to_string(),
            title: title.to_string(),
            course: "Computer Vision".to_string(),
            instructor: instructor.to_string(),
            due_date: date(due),
            submitted_date: None,
            status,
            priority,
            category: "Project".to_string(),
            description: String::new(),
            max_score: 100,
            weight: 20,
            estimated_time: "4-6 hours".to_string(),
            starred: false,
            score: None,
            feedback: None,
        }
    }

    fn fixture() -> Vec<Assignment> {
        vec![
            assignment("a1", "Computer Vision Project", "Dr. Sarah Chen", "2025-07-15", AssignmentStatus::Pending, Priority::High),
            assignment("a2", "ML Quiz", "Prof. Rodriguez", "2025-07-18", AssignmentStatus::Pending, Priority::Medium),
            assignment("a3", "Data Report", "Dr. Vision Smith", "2025-07-20", AssignmentStatus::Pending, Priority::Medium),
            assignment("a4", "Neural Networks Lab", "Dr. Liu", "2025-07-10", AssignmentStatus::Completed, Priority::High),
            assignment("a5", "Paper Review", "Dr. Sarah Chen", "2025-07-05", AssignmentStatus::Completed, Priority::Low),
            assignment("a6", "Group Presentation", "Prof. Rodriguez", "2025-07-25", AssignmentStatus::Pending, Priority::High),
            assignment("a7", "Algorithms Homework", "Dr. Johnson", "2025-07-08", AssignmentStatus::Overdue, Priority::High),
        ]
    }

    #[test]
    fn pending_sorted_by_due_date_first_page() {
        let items = fixture();
        let criteria = ListCriteria::default()
            .with_filter("status", "pending")
            .sorted_by("due_date", SortDirection::Asc)
            .on_page(1, 5);

        let page = derive_view(&items, &criteria);

        assert_eq!(page.total_count, 4);
        assert_eq!(page.page_count, 1);
        let ids: Vec<&str> = page.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "a6"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let items = fixture();
        let criteria = ListCriteria::default().with_search("vision").on_page(1, 10);

        let page = derive_view(&items, &criteria);

        let ids: Vec<&str> = page.items.iter().map(|a| a.id.as_str()).collect();
        // Matches the title "Computer Vision Project", the instructor
        // "Dr. Vision Smith", and every item's course "Computer Vision" --
        // narrow the course to prove field-level matching.
        assert!(ids.contains(&"a1"));
        assert!(ids.contains(&"a3"));

        let mut narrowed = fixture();
        for a in &mut narrowed {
            a.course = "Algorithms".to_string();
        }
        let page = derive_view(&narrowed, &criteria);
        let ids: Vec<&str> = page.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[test]
    fn all_sentinel_disables_a_filter() {
        let items = fixture();
        let criteria = ListCriteria::default()
            .with_filter("status", "all")
            .on_page(1, 10);

        assert_eq!(derive_view(&items, &criteria).total_count, items.len());
    }

    #[test]
    fn page_index_clamps_to_valid_range() {
        let items = fixture();
        let criteria = ListCriteria::default().on_page(99, 5);
        let page = derive_view(&items, &criteria);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 2);

        let criteria = ListCriteria::default().on_page(0, 5);
        let page = derive_view(&items, &criteria);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn empty_result_still_reports_one_page() {
        let items = fixture();
        let criteria = ListCriteria::default().with_search("no such assignment");
        let page = derive_view(&items, &criteria);
        assert_eq!(page.total_count, 0);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn sort_ties_keep_source_order() {
        let items = fixture();
        let criteria = ListCriteria::default()
            .sorted_by("priority", SortDirection::Asc)
            .on_page(1, 10);

        let page = derive_view(&items, &criteria);
        let highs: Vec<&str> = page
            .items
            .iter()
            .filter(|a| a.priority == Priority::High)
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(highs, vec!["a1", "a4", "a6", "a7"]);
    }

    #[test]
    fn descending_sort_reverses_comparator() {
        let items = fixture();
        let criteria = ListCriteria::default()
            .sorted_by("due_date", SortDirection::Desc)
            .on_page(1, 10);

        let page = derive_view(&items, &criteria);
        assert_eq!(page.items.first().unwrap().id, "a6");
        assert_eq!(page.items.last().unwrap().id, "a5");
    }
}
