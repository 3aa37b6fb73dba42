use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::domain::CourseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub enrolled: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularCourseView {
    pub course_id: CourseId,
    pub title: String,
    pub count: usize,
    pub share_percent: f64,
}

/// JSON body of the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub total_employees: usize,
    pub total_courses: usize,
    pub total_registrations: usize,
    pub by_status: StatusBreakdown,
    pub average_progress_percent: f64,
    pub average_course_hours: f64,
    pub recent_window_days: u32,
    pub recent_registrations: usize,
    pub employees_without_registrations: usize,
    pub completion_rate_percent: f64,
    pub engagement_percent: f64,
    pub popular_courses: Vec<PopularCourseView>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

impl Recommendation {
    pub(crate) fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}
