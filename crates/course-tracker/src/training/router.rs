use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::domain::{
    CourseId, CourseSubmission, EmployeeId, EmployeeSubmission, RegistrationId,
    RegistrationSubmission, Visibility,
};
use super::service::{RenderedReport, TrainingService, TrainingServiceError};
use super::store::RecordStore;
use super::validation::ValidationError;

type Service<S> = State<Arc<TrainingService<S>>>;
type ApiResult = Result<Response, ApiError>;
type IdPath = Result<Path<u64>, PathRejection>;

/// Router exposing the training operations under `/api`.
pub fn training_router<S>(service: Arc<TrainingService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route(
            "/api/employees",
            get(list_employees::<S>).post(create_employee::<S>),
        )
        .route("/api/employees/search", get(search_employees::<S>))
        .route(
            "/api/employees/:employee_id",
            get(get_employee::<S>).delete(delete_employee::<S>),
        )
        .route(
            "/api/courses",
            get(list_courses::<S>).post(create_course::<S>),
        )
        .route(
            "/api/courses/:course_id",
            get(get_course::<S>).delete(delete_course::<S>),
        )
        .route(
            "/api/registrations",
            get(list_registrations::<S>).post(create_registration::<S>),
        )
        .route(
            "/api/registrations/:registration_id",
            get(get_registration::<S>).delete(delete_registration::<S>),
        )
        .route(
            "/api/registrations/:registration_id/status",
            put(update_status::<S>),
        )
        .route(
            "/api/registrations/:registration_id/progress",
            put(update_progress::<S>),
        )
        .route("/api/statistics", get(statistics::<S>))
        .route("/api/report/generate", get(csv_report::<S>))
        .route("/api/report/view-html", get(view_html_report::<S>))
        .route("/api/report/download-html", get(download_html_report::<S>))
        .route(
            "/api/report/recommendations",
            get(recommendations::<S>),
        )
        .with_state(service)
}

/// `?deleted=true` selects soft-deleted records; anything else selects active ones.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct VisibilityQuery {
    #[serde(default)]
    pub(crate) deleted: Option<String>,
}

impl VisibilityQuery {
    fn visibility(&self) -> Visibility {
        let deleted = self
            .deleted
            .as_deref()
            .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));
        Visibility::from_deleted_flag(deleted)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    deleted: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

/// A missing `progress_percent` is treated as 0.
#[derive(Debug, Deserialize)]
pub(crate) struct ProgressUpdate {
    #[serde(default)]
    pub(crate) progress_percent: Option<i64>,
}

/// Failure of a handler: either the request could not be extracted or the service refused it.
#[derive(Debug)]
pub(crate) enum ApiError {
    Rejected(String),
    Service(TrainingServiceError),
}

impl From<TrainingServiceError> for ApiError {
    fn from(value: TrainingServiceError) -> Self {
        Self::Service(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Service(err) => err.into_response(),
        }
    }
}

/// Unwraps an extractor result; rejections become a 400 with the usual error body.
fn extracted<T, R>(extraction: Result<T, R>) -> Result<T, ApiError>
where
    R: std::fmt::Display,
{
    extraction.map_err(|rejection| {
        debug!(error = %rejection, "rejected request");
        ApiError::Rejected(rejection.to_string())
    })
}

fn deleted(kind: &str, id: impl std::fmt::Display) -> Response {
    Json(json!({
        "message": format!("{kind} deleted"),
        "id": id.to_string(),
    }))
    .into_response()
}

pub(crate) async fn list_employees<S>(
    State(service): Service<S>,
    query: Result<Query<VisibilityQuery>, QueryRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Query(query) = extracted(query)?;
    Ok(Json(service.employees(query.visibility())?).into_response())
}

pub(crate) async fn create_employee<S>(
    State(service): Service<S>,
    body: Result<Json<EmployeeSubmission>, JsonRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Json(submission) = extracted(body)?;
    let employee = service.create_employee(submission)?;
    Ok((StatusCode::CREATED, Json(employee)).into_response())
}

pub(crate) async fn search_employees<S>(
    State(service): Service<S>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Query(query) = extracted(query)?;
    let visibility = VisibilityQuery {
        deleted: query.deleted,
    }
    .visibility();
    Ok(Json(service.search_employees(&query.q, visibility)?).into_response())
}

pub(crate) async fn get_employee<S>(
    State(service): Service<S>,
    path: IdPath,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(employee_id) = extracted(path)?;
    Ok(Json(service.employee(EmployeeId(employee_id))?).into_response())
}

pub(crate) async fn delete_employee<S>(
    State(service): Service<S>,
    path: IdPath,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(employee_id) = extracted(path)?;
    let employee = service.delete_employee(EmployeeId(employee_id))?;
    Ok(deleted("employee", employee.id))
}

pub(crate) async fn list_courses<S>(
    State(service): Service<S>,
    query: Result<Query<VisibilityQuery>, QueryRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Query(query) = extracted(query)?;
    Ok(Json(service.courses(query.visibility())?).into_response())
}

pub(crate) async fn create_course<S>(
    State(service): Service<S>,
    body: Result<Json<CourseSubmission>, JsonRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Json(submission) = extracted(body)?;
    let course = service.create_course(submission)?;
    Ok((StatusCode::CREATED, Json(course)).into_response())
}

pub(crate) async fn get_course<S>(
    State(service): Service<S>,
    path: IdPath,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(course_id) = extracted(path)?;
    Ok(Json(service.course(CourseId(course_id))?).into_response())
}

pub(crate) async fn delete_course<S>(
    State(service): Service<S>,
    path: IdPath,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(course_id) = extracted(path)?;
    let course = service.delete_course(CourseId(course_id))?;
    Ok(deleted("course", course.id))
}

pub(crate) async fn list_registrations<S>(
    State(service): Service<S>,
    query: Result<Query<VisibilityQuery>, QueryRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Query(query) = extracted(query)?;
    Ok(Json(service.registrations(query.visibility())?).into_response())
}

pub(crate) async fn create_registration<S>(
    State(service): Service<S>,
    body: Result<Json<RegistrationSubmission>, JsonRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Json(submission) = extracted(body)?;
    let registration = service.enroll(submission)?;
    Ok((StatusCode::CREATED, Json(registration)).into_response())
}

pub(crate) async fn get_registration<S>(
    State(service): Service<S>,
    path: IdPath,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(registration_id) = extracted(path)?;
    Ok(Json(service.registration(RegistrationId(registration_id))?).into_response())
}

pub(crate) async fn update_status<S>(
    State(service): Service<S>,
    path: IdPath,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(registration_id) = extracted(path)?;
    let Json(update) = extracted(body)?;
    let status = update
        .status
        .ok_or(TrainingServiceError::from(ValidationError::MissingField("status")))?;
    let registration = service.update_status(RegistrationId(registration_id), &status)?;
    Ok(Json(registration).into_response())
}

pub(crate) async fn update_progress<S>(
    State(service): Service<S>,
    path: IdPath,
    body: Result<Json<ProgressUpdate>, JsonRejection>,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(registration_id) = extracted(path)?;
    let Json(update) = extracted(body)?;
    let progress = update.progress_percent.unwrap_or(0);
    let registration = service.update_progress(RegistrationId(registration_id), progress)?;
    Ok(Json(registration).into_response())
}

pub(crate) async fn delete_registration<S>(
    State(service): Service<S>,
    path: IdPath,
) -> ApiResult
where
    S: RecordStore + 'static,
{
    let Path(registration_id) = extracted(path)?;
    let registration = service.delete_registration(RegistrationId(registration_id))?;
    Ok(deleted("registration", registration.id))
}

pub(crate) async fn statistics<S>(State(service): Service<S>) -> ApiResult
where
    S: RecordStore + 'static,
{
    Ok(Json(service.statistics()?.summary()).into_response())
}

pub(crate) async fn csv_report<S>(State(service): Service<S>) -> ApiResult
where
    S: RecordStore + 'static,
{
    let report = service.csv_report()?;
    Ok(attachment(report, mime::TEXT_CSV_UTF_8.as_ref()))
}

pub(crate) async fn view_html_report<S>(State(service): Service<S>) -> ApiResult
where
    S: RecordStore + 'static,
{
    let report = service.html_report()?;
    Ok((
        [(header::CONTENT_TYPE, mime::TEXT_HTML_UTF_8.as_ref())],
        report.body,
    )
        .into_response())
}

pub(crate) async fn download_html_report<S>(State(service): Service<S>) -> ApiResult
where
    S: RecordStore + 'static,
{
    let report = service.html_report()?;
    Ok(attachment(report, mime::TEXT_HTML_UTF_8.as_ref()))
}

pub(crate) async fn recommendations<S>(State(service): Service<S>) -> ApiResult
where
    S: RecordStore + 'static,
{
    Ok(Json(service.recommendations()?).into_response())
}

fn attachment(report: RenderedReport, content_type: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    )
        .into_response()
}

impl TrainingServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Lifecycle(_) | Self::Duplicate(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrainingServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_error() {
            debug!(error = %self, status = status.as_u16(), "training request rejected");
            self.to_string()
        } else {
            warn!(error = %self, status = status.as_u16(), "training request failed");
            "internal server error".to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
