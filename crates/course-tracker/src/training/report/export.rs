use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use super::summary::TrainingStatistics;

const REPORT_TITLE: &str = "Course completion report";
const TEMPLATE_NAME: &str = "course_report.html";
const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write csv report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write report buffer: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render html report: {0}")]
    Template(#[from] tera::Error),
    #[error("report is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Attachment name of the CSV download.
pub fn csv_filename() -> &'static str {
    "course_report.csv"
}

/// Attachment name of the HTML download, dated `DD_MM_YYYY`.
pub fn html_filename(generated_at: DateTime<Utc>) -> String {
    format!("course_report_{}.html", generated_at.format("%d_%m_%Y"))
}

struct MetricRow {
    label: String,
    value: String,
}

fn metric(label: impl Into<String>, value: impl ToString) -> MetricRow {
    MetricRow {
        label: label.into(),
        value: value.to_string(),
    }
}

fn metric_rows(stats: &TrainingStatistics) -> Vec<MetricRow> {
    vec![
        metric("Employees", stats.total_employees),
        metric("Courses", stats.total_courses),
        metric("Registrations", stats.total_registrations),
        metric("Enrolled", stats.status_counts.enrolled),
        metric("In progress", stats.status_counts.in_progress),
        metric("Completed", stats.status_counts.completed),
        metric("Completion rate, %", format!("{:.1}", stats.completion_rate())),
        metric("Engagement, %", format!("{:.1}", stats.engagement_rate())),
        metric("Average progress, %", format!("{:.1}", stats.average_progress)),
        metric(
            "Average course duration, h",
            format!("{:.1}", stats.average_course_hours),
        ),
        metric(
            format!("Registrations in the last {} days", stats.recent_window_days),
            stats.recent_registrations,
        ),
        metric(
            "Employees without courses",
            stats.employees_without_registrations,
        ),
    ]
}

fn csv_section<F>(buffer: &mut Vec<u8>, write_rows: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut csv::Writer<&mut Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(buffer);
    write_rows(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Renders the header, `METRICS` and `COURSE POPULARITY` sections separated by blank lines.
pub fn render_csv(stats: &TrainingStatistics) -> Result<String, ReportError> {
    let mut buffer = Vec::new();

    csv_section(&mut buffer, |writer| {
        writer.write_record([REPORT_TITLE])?;
        writer.write_record([format!(
            "Generated: {}",
            stats.generated_at.format(TIMESTAMP_FORMAT)
        )])
    })?;
    buffer.write_all(b"\n")?;

    csv_section(&mut buffer, |writer| {
        writer.write_record(["METRICS"])?;
        for row in metric_rows(stats) {
            writer.write_record([row.label, row.value])?;
        }
        Ok(())
    })?;
    buffer.write_all(b"\n")?;

    csv_section(&mut buffer, |writer| {
        writer.write_record(["COURSE POPULARITY"])?;
        writer.write_record(["Course", "Registrations", "Share, %"])?;
        if stats.course_popularity.is_empty() {
            writer.write_record(["No data"])?;
        }
        for entry in &stats.course_popularity {
            writer.write_record([
                entry.title.clone(),
                entry.registrations.to_string(),
                format!("{:.1}", entry.share_percent),
            ])?;
        }
        Ok(())
    })?;

    Ok(String::from_utf8(buffer)?)
}

#[derive(Serialize)]
struct HtmlMetric {
    label: String,
    value: String,
}

#[derive(Serialize)]
struct HtmlCourseRow {
    title: String,
    count: usize,
    share: String,
}

/// Renders the two-sheet HTML report. Course titles are escaped by the template engine.
pub fn render_html(stats: &TrainingStatistics) -> Result<String, ReportError> {
    let mut engine = Tera::default();
    engine.add_raw_template(TEMPLATE_NAME, HTML_TEMPLATE)?;

    let metrics: Vec<HtmlMetric> = metric_rows(stats)
        .into_iter()
        .map(|row| HtmlMetric {
            label: row.label,
            value: row.value,
        })
        .collect();
    let courses: Vec<HtmlCourseRow> = stats
        .course_popularity
        .iter()
        .map(|entry| HtmlCourseRow {
            title: entry.title.clone(),
            count: entry.registrations,
            share: format!("{:.1}%", entry.share_percent),
        })
        .collect();

    let mut context = Context::new();
    context.insert("title", REPORT_TITLE);
    context.insert(
        "generated_at",
        &stats.generated_at.format(TIMESTAMP_FORMAT).to_string(),
    );
    context.insert("metrics", &metrics);
    context.insert("courses", &courses);
    context.insert("observations", &super::observations(stats));

    Ok(engine.render(TEMPLATE_NAME, &context)?)
}

const HTML_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
body{font-family:Arial,sans-serif;margin:24px;color:#111}
table{border-collapse:collapse;width:100%;margin:10px 0 16px}
th,td{border:1px solid #ddd;padding:6px 8px;font-size:13px}
th{background:#f3f4f6}
.pagebreak{page-break-before:always}
</style>
</head>
<body>
<h1>{{ title }}</h1>
<div style="color:#666;font-size:12px">Generated: {{ generated_at }}</div>

<h2>Sheet 1: Metrics</h2>
<table>
<tr><th>Metric</th><th>Value</th></tr>
{% for metric in metrics %}<tr><td>{{ metric.label }}</td><td>{{ metric.value }}</td></tr>
{% endfor %}</table>

<h2>Observations</h2>
<ul>
{% for observation in observations %}<li>{{ observation }}</li>
{% endfor %}</ul>

<div class="pagebreak"></div>
<h2>Sheet 2: Course popularity</h2>
<table>
<tr><th>Course</th><th>Registrations</th><th>Share</th></tr>
{% if courses | length > 0 %}{% for course in courses %}<tr><td>{{ course.title }}</td><td>{{ course.count }}</td><td>{{ course.share }}</td></tr>
{% endfor %}{% else %}<tr><td colspan="3">No data</td></tr>
{% endif %}</table>
</body>
</html>
"#;
