//! Session-scoped sample catalog. Seeded relative to the launch date so
//! the pending/overdue mix stays realistic.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::models::{
    Announcement, Assignment, AssignmentStatus, Discussion, Priority, ScheduleEvent,
};

fn id() -> String {
    Uuid::new_v4().to_string()
}

pub fn assignments(today: NaiveDate) -> Vec<Assignment> {
    let assignment = |title: &str,
                      course: &str,
                      instructor: &str,
                      due_offset: i64,
                      status: AssignmentStatus,
                      priority: Priority,
                      category: &str,
                      description: &str,
                      max_score: u32,
                      weight: u32,
                      estimated_time: &str,
                      starred: bool| Assignment {
        id: id(),
        title: title.to_string(),
        course: course.to_string(),
        instructor: instructor.to_string(),
        due_date: today + Duration::days(due_offset),
        submitted_date: None,
        status,
        priority,
        category: category.to_string(),
        description: description.to_string(),
        max_score,
        weight,
        estimated_time: estimated_time.to_string(),
        starred,
        score: None,
        feedback: None,
    };

    let mut items = vec![
        assignment(
            "Computer Vision Project",
            "Computer Vision",
            "Dr. Sarah Chen",
            3,
            AssignmentStatus::Pending,
            Priority::High,
            "Project",
            "Implement object detection using the YOLO family of models",
            100,
            20,
            "8-10 hours",
            true,
        ),
        assignment(
            "ML Quiz - Supervised Learning",
            "Machine Learning",
            "Prof. Michael Rodriguez",
            6,
            AssignmentStatus::Pending,
            Priority::Medium,
            "Quiz",
            "Online quiz covering decision trees, SVM, and ensemble methods",
            50,
            10,
            "45 minutes",
            false,
        ),
        assignment(
            "Data Visualization Report",
            "Data Visualization",
            "Dr. Emily Watson",
            8,
            AssignmentStatus::Pending,
            Priority::Medium,
            "Report",
            "Build interactive dashboards for the class energy dataset",
            75,
            15,
            "6-8 hours",
            false,
        ),
        assignment(
            "Neural Networks Lab",
            "Deep Learning",
            "Dr. James Liu",
            -2,
            AssignmentStatus::Completed,
            Priority::High,
            "Lab",
            "Train a CNN for image classification and report accuracy",
            100,
            25,
            "4-6 hours",
            false,
        ),
        assignment(
            "Research Paper Review",
            "Computer Vision",
            "Dr. Sarah Chen",
            -7,
            AssignmentStatus::Completed,
            Priority::Low,
            "Review",
            "Critical analysis of a recent paper on attention mechanisms",
            25,
            5,
            "2-3 hours",
            false,
        ),
        assignment(
            "Group Presentation",
            "Machine Learning",
            "Prof. Michael Rodriguez",
            13,
            AssignmentStatus::Pending,
            Priority::High,
            "Presentation",
            "Present findings on ensemble learning methods",
            100,
            20,
            "10-12 hours",
            true,
        ),
        assignment(
            "Advanced Algorithms Homework",
            "Algorithms",
            "Dr. Alice Johnson",
            -4,
            AssignmentStatus::Pending,
            Priority::High,
            "Homework",
            "Dynamic programming and graph theory problem set",
            50,
            15,
            "4-5 hours",
            false,
        ),
    ];

    // Completed items carry grades.
    items[3].submitted_date = Some(today - Duration::days(3));
    items[3].score = Some(92);
    items[3].feedback = Some("Excellent implementation. Consider adding data augmentation.".to_string());
    items[4].submitted_date = Some(today - Duration::days(8));
    items[4].score = Some(23);
    items[4].feedback = Some("Good analysis, push harder on the critical evaluation.".to_string());

    items
}

pub fn announcements(today: NaiveDate) -> Vec<Announcement> {
    let announcement = |title: &str,
                        course: &str,
                        author: &str,
                        days_ago: i64,
                        category: &str,
                        priority: Priority,
                        content: &str,
                        read: bool,
                        starred: bool,
                        important: bool| Announcement {
        id: id(),
        title: title.to_string(),
        course: course.to_string(),
        author: author.to_string(),
        date: today - Duration::days(days_ago),
        category: category.to_string(),
        priority,
        content: content.to_string(),
        read,
        starred,
        important,
    };

    vec![
        announcement(
            "Midterm moved to next Friday",
            "Computer Vision",
            "Dr. Sarah Chen",
            0,
            "Exam",
            Priority::High,
            "The midterm has been rescheduled to give everyone an extra week of preparation.",
            false,
            true,
            true,
        ),
        announcement(
            "Office hours cancelled this week",
            "Machine Learning",
            "Prof. Michael Rodriguez",
            1,
            "General",
            Priority::Medium,
            "Travelling to a conference; use the discussion board for questions.",
            false,
            false,
            false,
        ),
        announcement(
            "New dataset published for the course project",
            "Data Visualization",
            "Dr. Emily Watson",
            2,
            "Course Material",
            Priority::Medium,
            "The cleaned energy consumption dataset is now on the course page.",
            true,
            false,
            false,
        ),
        announcement(
            "Guest lecture: production ML systems",
            "Deep Learning",
            "Dr. James Liu",
            3,
            "Event",
            Priority::Low,
            "Industry guest lecture on deploying models at scale, attendance optional.",
            false,
            true,
            false,
        ),
        announcement(
            "Lab 3 grading published",
            "Deep Learning",
            "Dr. James Liu",
            5,
            "Grades",
            Priority::Medium,
            "Scores and feedback for the CNN lab are available in the gradebook.",
            true,
            false,
            false,
        ),
        announcement(
            "Problem set 4 clarification",
            "Algorithms",
            "Dr. Alice Johnson",
            6,
            "Course Material",
            Priority::High,
            "Question 3b should read 'minimum spanning tree', not 'shortest path'.",
            true,
            false,
            true,
        ),
    ]
}

pub fn discussions(today: NaiveDate) -> Vec<Discussion> {
    let discussion = |title: &str,
                      course: &str,
                      author: &str,
                      created_days_ago: i64,
                      activity_days_ago: i64,
                      content: &str,
                      tags: &[&str],
                      replies: u32,
                      likes: u32,
                      resolved: bool| Discussion {
        id: id(),
        title: title.to_string(),
        course: course.to_string(),
        author: author.to_string(),
        created_at: today - Duration::days(created_days_ago),
        last_activity: today - Duration::days(activity_days_ago),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        replies,
        likes,
        liked_by_me: false,
        resolved,
    };

    vec![
        discussion(
            "YOLO anchor boxes vs anchor-free heads",
            "Computer Vision",
            "Maya Patel",
            1,
            0,
            "For the project, is an anchor-free detector acceptable or should we stick to the lecture material?",
            &["project", "detection"],
            4,
            7,
            false,
        ),
        discussion(
            "Cross-validation splits for small datasets",
            "Machine Learning",
            "Tom Alvarez",
            2,
            1,
            "Five folds on 200 samples gives very noisy estimates. Is leave-one-out acceptable?",
            &["evaluation"],
            6,
            11,
            true,
        ),
        discussion(
            "D3 vs Vega-Lite for the report",
            "Data Visualization",
            "Lin Zhao",
            3,
            2,
            "Does the report require hand-written D3, or are higher-level grammars fine?",
            &["tooling", "report"],
            2,
            3,
            true,
        ),
        discussion(
            "Vanishing gradients in deep RNNs",
            "Deep Learning",
            "Sofia Rossi",
            5,
            1,
            "Even with LSTM cells my 8-layer model stops learning. Initialization tips?",
            &["training", "rnn"],
            9,
            15,
            false,
        ),
        discussion(
            "Amortized analysis of union-find",
            "Algorithms",
            "Daniel Okafor",
            7,
            4,
            "Struggling with the inverse Ackermann bound proof from lecture 9.",
            &["theory"],
            3,
            5,
            false,
        ),
    ]
}

pub fn schedule() -> Vec<ScheduleEvent> {
    let event = |title: &str,
                 course: &str,
                 day: &str,
                 start: &str,
                 end: &str,
                 location: &str,
                 event_type: &str,
                 instructor: &str| ScheduleEvent {
        id: id(),
        title: title.to_string(),
        course: course.to_string(),
        day: day.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        location: location.to_string(),
        event_type: event_type.to_string(),
        instructor: instructor.to_string(),
    };

    vec![
        event("Computer Vision Lecture", "Computer Vision", "Monday", "10:00", "11:30", "Hall A", "lecture", "Dr. Sarah Chen"),
        event("ML Lab Session", "Machine Learning", "Monday", "14:00", "16:00", "Lab 204", "lab", "Prof. Michael Rodriguez"),
        event("Deep Learning Lecture", "Deep Learning", "Tuesday", "09:00", "10:30", "Hall C", "lecture", "Dr. James Liu"),
        event("Data Viz Studio", "Data Visualization", "Wednesday", "13:00", "15:00", "Studio 2", "lab", "Dr. Emily Watson"),
        event("Computer Vision Lecture", "Computer Vision", "Thursday", "10:00", "11:30", "Hall A", "lecture", "Dr. Sarah Chen"),
        event("Algorithms Lecture", "Algorithms", "Thursday", "15:00", "16:30", "Hall B", "lecture", "Dr. Alice Johnson"),
        event("Office Hours", "Machine Learning", "Friday", "11:00", "12:00", "Room 318", "office-hours", "Prof. Michael Rodriguez"),
    ]
}
