use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};

use super::super::domain::{Course, CourseId, Employee, Registration, RegistrationStatus};
use super::views::{PopularCourseView, Recommendation, StatisticsView, StatusBreakdown};
use super::ReportConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub enrolled: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: RegistrationStatus) {
        match status {
            RegistrationStatus::Enrolled => self.enrolled += 1,
            RegistrationStatus::InProgress => self.in_progress += 1,
            RegistrationStatus::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoursePopularity {
    pub course_id: CourseId,
    pub title: String,
    pub registrations: usize,
    pub share_percent: f64,
}

/// Aggregate figures over active records, computed once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingStatistics {
    pub generated_at: DateTime<Utc>,
    pub total_employees: usize,
    pub total_courses: usize,
    pub total_registrations: usize,
    pub status_counts: StatusCounts,
    pub average_progress: f64,
    pub average_course_hours: f64,
    pub recent_window_days: u32,
    pub recent_registrations: usize,
    pub employees_without_registrations: usize,
    /// Every course with at least one active registration, most popular first.
    pub course_popularity: Vec<CoursePopularity>,
    popular_limit: usize,
}

impl TrainingStatistics {
    /// Deleted records in the inputs are ignored, so callers may pass full listings.
    pub fn collect(
        employees: &[Employee],
        courses: &[Course],
        registrations: &[Registration],
        now: DateTime<Utc>,
        config: &ReportConfig,
    ) -> Self {
        let employees: Vec<&Employee> = employees
            .iter()
            .filter(|employee| employee.lifecycle.is_active())
            .collect();
        let courses: Vec<&Course> = courses
            .iter()
            .filter(|course| course.lifecycle.is_active())
            .collect();
        let registrations: Vec<&Registration> = registrations
            .iter()
            .filter(|registration| registration.lifecycle.is_active())
            .collect();

        let mut status_counts = StatusCounts::default();
        for registration in &registrations {
            status_counts.record(registration.status);
        }

        let average_progress = mean(
            registrations
                .iter()
                .map(|registration| f64::from(registration.progress.value())),
        );
        let average_course_hours =
            mean(courses.iter().map(|course| f64::from(course.duration_hours)));

        let window_start = now - Duration::days(i64::from(config.recent_window_days));
        let recent_registrations = registrations
            .iter()
            .filter(|registration| registration.registered_at >= window_start)
            .count();

        let enrolled_employees: BTreeSet<_> = registrations
            .iter()
            .map(|registration| registration.employee_id)
            .collect();
        let employees_without_registrations = employees
            .iter()
            .filter(|employee| !enrolled_employees.contains(&employee.id))
            .count();

        Self {
            generated_at: now,
            total_employees: employees.len(),
            total_courses: courses.len(),
            total_registrations: registrations.len(),
            status_counts,
            average_progress,
            average_course_hours,
            recent_window_days: config.recent_window_days,
            recent_registrations,
            employees_without_registrations,
            course_popularity: rank_courses(&courses, &registrations),
            popular_limit: config.popular_limit,
        }
    }

    /// Completed share of registrations, in percent; 0 without registrations.
    pub fn completion_rate(&self) -> f64 {
        percent(self.status_counts.completed, self.total_registrations)
    }

    /// Active employees with at least one active registration.
    pub fn engaged_employees(&self) -> usize {
        self.total_employees
            .saturating_sub(self.employees_without_registrations)
    }

    /// Share of employees with at least one registration, in percent; 0 without employees.
    pub fn engagement_rate(&self) -> f64 {
        percent(self.engaged_employees(), self.total_employees)
    }

    pub fn summary(&self) -> StatisticsView {
        StatisticsView {
            total_employees: self.total_employees,
            total_courses: self.total_courses,
            total_registrations: self.total_registrations,
            by_status: StatusBreakdown {
                enrolled: self.status_counts.enrolled,
                in_progress: self.status_counts.in_progress,
                completed: self.status_counts.completed,
            },
            average_progress_percent: self.average_progress,
            average_course_hours: self.average_course_hours,
            recent_window_days: self.recent_window_days,
            recent_registrations: self.recent_registrations,
            employees_without_registrations: self.employees_without_registrations,
            completion_rate_percent: round_tenth(self.completion_rate()),
            engagement_percent: round_tenth(self.engagement_rate()),
            popular_courses: self
                .course_popularity
                .iter()
                .take(self.popular_limit)
                .map(CoursePopularity::to_view)
                .collect(),
            generated_at: self.generated_at,
        }
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        super::generate_recommendations(self)
    }
}

impl CoursePopularity {
    pub fn to_view(&self) -> PopularCourseView {
        PopularCourseView {
            course_id: self.course_id,
            title: self.title.clone(),
            count: self.registrations,
            share_percent: self.share_percent,
        }
    }
}

fn rank_courses(courses: &[&Course], registrations: &[&Registration]) -> Vec<CoursePopularity> {
    let mut counts: BTreeMap<CourseId, usize> = BTreeMap::new();
    for registration in registrations {
        *counts.entry(registration.course_id).or_default() += 1;
    }

    let mut ranked: Vec<(&Course, usize)> = courses
        .iter()
        .filter_map(|course| counts.get(&course.id).map(|count| (*course, *count)))
        .collect();
    ranked.sort_by(|(left, left_count), (right, right_count)| {
        right_count
            .cmp(left_count)
            .then_with(|| left.title.cmp(&right.title))
    });

    let counted: usize = ranked.iter().map(|(_, count)| count).sum();
    ranked
        .into_iter()
        .map(|(course, count)| CoursePopularity {
            course_id: course.id,
            title: course.title.clone(),
            registrations: count,
            share_percent: round_tenth(percent(count, counted)),
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        round_tenth(sum / count as f64)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
