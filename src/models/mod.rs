use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================
// Course catalog
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Submitted,
    Completed,
    Overdue,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Submitted => "submitted",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Rank for comparisons: high sorts before medium before low.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub course: String,
    pub instructor: String,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub priority: Priority,
    pub category: String,
    pub description: String,
    pub max_score: u32,
    pub weight: u32,
    pub estimated_time: String,
    pub starred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub course: String,
    pub author: String,
    pub date: NaiveDate,
    pub category: String,
    pub priority: Priority,
    pub content: String,
    pub read: bool,
    pub starred: bool,
    pub important: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub title: String,
    pub course: String,
    pub author: String,
    pub created_at: NaiveDate,
    pub last_activity: NaiveDate,
    pub content: String,
    pub tags: Vec<String>,
    pub replies: u32,
    pub likes: u32,
    pub liked_by_me: bool,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: String,
    pub title: String,
    pub course: String,
    /// Weekday name, e.g. "Monday".
    pub day: String,
    /// 24h clock, e.g. "10:00".
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub event_type: String,
    pub instructor: String,
}

// ============================================================
// Preferences & profile
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}
