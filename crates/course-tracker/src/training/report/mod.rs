mod export;
mod insights;
mod summary;
mod views;

pub use export::{csv_filename, html_filename, render_csv, render_html, ReportError};
pub(crate) use insights::{generate_recommendations, observations};
pub use summary::{CoursePopularity, StatusCounts, TrainingStatistics};
pub use views::{PopularCourseView, Recommendation, StatisticsView, StatusBreakdown};

/// Tunables for aggregate statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    /// Trailing window, in days, for the "recent registrations" metric.
    pub recent_window_days: u32,
    /// How many ranked courses the statistics view includes.
    pub popular_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_window_days: 30,
            popular_limit: 5,
        }
    }
}
