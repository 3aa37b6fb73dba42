use crate::infra::{in_memory_service, InMemoryTrainingService};
use clap::{Args, ValueEnum};
use course_tracker::error::AppError;
use course_tracker::training::seed::seed_demo_dataset;
use course_tracker::training::{RenderedReport, ReportConfig, StatisticsView, Visibility};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Trailing window, in days, for the recent registrations metric
    #[arg(long)]
    pub(crate) recent_days: Option<u32>,
    /// Print the statistics payload as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum ReportFormat {
    #[default]
    Csv,
    Html,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Output format of the completion report
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    pub(crate) format: ReportFormat,
    /// Write the report to this path instead of standard output
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

fn seeded_service(report: ReportConfig) -> Result<Arc<InMemoryTrainingService>, AppError> {
    let service = in_memory_service(report);
    seed_demo_dataset(&service)?;
    Ok(service)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut report = ReportConfig::default();
    if let Some(days) = args.recent_days {
        report.recent_window_days = days;
    }

    let service = seeded_service(report)?;
    let view = service.statistics()?.summary();

    if args.json {
        println!("{}", statistics_json(&view)?);
        return Ok(());
    }

    println!("Course tracker demo");
    render_statistics(&view);

    println!("\nEnrollments");
    for registration in service.registrations(Visibility::Active)? {
        println!(
            "- {} / {}: {} ({}%)",
            registration.employee_name.as_deref().unwrap_or("unknown employee"),
            registration.course_title.as_deref().unwrap_or("unknown course"),
            registration.status,
            registration.progress_percent
        );
    }

    println!("\nRecommendations");
    for recommendation in service.recommendations()? {
        println!("- {}: {}", recommendation.title, recommendation.description);
    }

    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let service = seeded_service(ReportConfig::default())?;
    let RenderedReport { filename, body } = match args.format {
        ReportFormat::Csv => service.csv_report()?,
        ReportFormat::Html => service.html_report()?,
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, body)?;
            println!("Wrote {} ({filename})", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn statistics_json(view: &StatisticsView) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(view)?)
}

fn render_statistics(view: &StatisticsView) {
    println!(
        "Employees: {} | Courses: {} | Registrations: {}",
        view.total_employees, view.total_courses, view.total_registrations
    );
    println!(
        "Enrolled: {} | In progress: {} | Completed: {}",
        view.by_status.enrolled, view.by_status.in_progress, view.by_status.completed
    );
    println!(
        "Completion rate: {:.1}% | Engagement: {:.1}% | Average progress: {:.1}%",
        view.completion_rate_percent, view.engagement_percent, view.average_progress_percent
    );
    println!(
        "Registrations in the last {} days: {}",
        view.recent_window_days, view.recent_registrations
    );

    if view.popular_courses.is_empty() {
        println!("\nPopular courses: none");
        return;
    }
    println!("\nPopular courses");
    for course in &view.popular_courses {
        println!(
            "- {}: {} registrations ({:.1}%)",
            course.title, course.count, course.share_percent
        );
    }
}
