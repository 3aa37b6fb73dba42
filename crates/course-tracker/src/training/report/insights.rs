use super::summary::TrainingStatistics;
use super::views::Recommendation;

const LOW_COMPLETION_PERCENT: f64 = 40.0;
const LOW_ENGAGEMENT_PERCENT: f64 = 50.0;
const LOW_PROGRESS_PERCENT: f64 = 50.0;

pub(crate) fn generate_recommendations(stats: &TrainingStatistics) -> Vec<Recommendation> {
    if stats.total_registrations == 0 {
        return vec![Recommendation::new(
            "No registrations",
            "Add at least one course registration to get meaningful analytics.",
        )];
    }

    let mut recommendations = Vec::new();
    if stats.completion_rate() < LOW_COMPLETION_PERCENT {
        recommendations.push(Recommendation::new(
            "Low completion rate",
            format!(
                "Only {:.1}% of registrations are completed. Review course length, difficulty and motivation.",
                stats.completion_rate()
            ),
        ));
    }
    if stats.engagement_rate() < LOW_ENGAGEMENT_PERCENT {
        recommendations.push(Recommendation::new(
            "Low engagement",
            format!(
                "{:.1}% of employees are enrolled in a course. Assign a baseline mandatory learning plan.",
                stats.engagement_rate()
            ),
        ));
    }
    if stats.average_progress < LOW_PROGRESS_PERCENT {
        recommendations.push(Recommendation::new(
            "Stalled progress",
            format!(
                "Average progress is {:.1}%. Add reminders and checkpoints.",
                stats.average_progress
            ),
        ));
    }
    if stats.employees_without_registrations > 0 {
        recommendations.push(Recommendation::new(
            "Employees without courses",
            format!(
                "{} employee(s) are not enrolled in any course.",
                stats.employees_without_registrations
            ),
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(
            "Training is on track",
            "Metrics look healthy; keep monitoring.",
        ));
    }
    recommendations
}

/// Short statements rendered as the bullet list of the HTML report.
pub(crate) fn observations(stats: &TrainingStatistics) -> Vec<String> {
    let mut observations = Vec::new();

    if stats.total_registrations > 0 {
        observations.push(format!(
            "{} of {} registrations completed ({:.1}% completion)",
            stats.status_counts.completed,
            stats.total_registrations,
            stats.completion_rate()
        ));
    }

    if stats.total_employees > 0 {
        observations.push(format!(
            "{} of {} employees enrolled in at least one course ({:.1}% engagement)",
            stats.engaged_employees(),
            stats.total_employees,
            stats.engagement_rate()
        ));
    }

    if stats.employees_without_registrations > 0 {
        observations.push(format!(
            "{} employee(s) have not started any training",
            stats.employees_without_registrations
        ));
    }

    if let Some(top) = stats.course_popularity.first() {
        observations.push(format!(
            "Most popular course: {} ({} registration(s))",
            top.title, top.registrations
        ));
    }

    if stats.total_registrations > 0 {
        observations.push(format!(
            "{} registration(s) in the last {} days",
            stats.recent_registrations, stats.recent_window_days
        ));
    } else {
        observations.push("No training activity recorded yet".to_string());
    }

    observations
}
