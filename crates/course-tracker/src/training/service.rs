use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{
    Course, CourseDraft, CourseId, CourseSubmission, CourseView, Employee, EmployeeDraft,
    EmployeeId, EmployeeSubmission, EmployeeView, ProgressPercent, Registration,
    RegistrationDraft, RegistrationId, RegistrationSubmission, RegistrationView, Visibility,
};
use super::lifecycle::{LifecycleError, ProgressChange};
use super::report::{self, Recommendation, ReportConfig, ReportError, TrainingStatistics};
use super::store::{RecordStore, StoreError, UniqueKey};
use super::validation::{self, required, ValidationError};

/// Kinds of records addressable by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Employee,
    Course,
    Registration,
}

impl RecordKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Course => "course",
            Self::Registration => "registration",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rendered report ready to be served as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub filename: String,
    pub body: String,
}

/// Entry point for every training operation. Each instance owns its store handle.
pub struct TrainingService<S> {
    store: Arc<S>,
    report: ReportConfig,
}

impl<S> TrainingService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>, report: ReportConfig) -> Self {
        Self { store, report }
    }

    pub fn report_config(&self) -> &ReportConfig {
        &self.report
    }

    pub fn create_employee(
        &self,
        submission: EmployeeSubmission,
    ) -> Result<EmployeeView, TrainingServiceError> {
        let full_name = required(&submission.full_name, "full_name")?.trim();
        validation::validate_full_name(full_name)?;
        let phone = required(&submission.phone, "phone")?.trim();
        validation::validate_phone(phone)?;
        let position = validation::parse_position(required(&submission.position, "position")?)?;

        let employee = self.store.insert_employee(EmployeeDraft {
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            position,
            created_at: Utc::now(),
        })?;

        info!(
            employee_id = %employee.id,
            position = employee.position.label(),
            "employee created"
        );
        Ok(employee.to_view())
    }

    pub fn employees(&self, visibility: Visibility) -> Result<Vec<EmployeeView>, TrainingServiceError> {
        let employees = self.store.employees(visibility)?;
        Ok(employees.iter().map(Employee::to_view).collect())
    }

    /// Case-insensitive match on the full name, or a substring match on the phone as stored.
    pub fn search_employees(
        &self,
        query: &str,
        visibility: Visibility,
    ) -> Result<Vec<EmployeeView>, TrainingServiceError> {
        let query = validation::validate_search_query(query)?;
        let needle = query.to_lowercase();

        let matches: Vec<EmployeeView> = self
            .store
            .employees(visibility)?
            .iter()
            .filter(|employee| {
                employee.full_name.to_lowercase().contains(&needle)
                    || employee.phone.contains(query)
            })
            .map(Employee::to_view)
            .collect();

        debug!(query, matches = matches.len(), "employee search");
        Ok(matches)
    }

    pub fn employee(&self, id: EmployeeId) -> Result<EmployeeView, TrainingServiceError> {
        Ok(self.fetch_employee(id)?.to_view())
    }

    /// Soft-deletes the employee. Existing registrations are left in place.
    pub fn delete_employee(&self, id: EmployeeId) -> Result<EmployeeView, TrainingServiceError> {
        let now = Utc::now();
        let (deleted, view) = self
            .store
            .modify_employee(id, |employee| {
                Ok::<_, TrainingServiceError>((
                    employee.lifecycle.soft_delete(now),
                    employee.to_view(),
                ))
            })
            .map_err(|err| err.or_not_found(RecordKind::Employee, id.0))?;
        if deleted {
            info!(employee_id = %id, "employee deleted");
        }
        Ok(view)
    }

    pub fn create_course(
        &self,
        submission: CourseSubmission,
    ) -> Result<CourseView, TrainingServiceError> {
        let title = validation::validate_title(required(&submission.title, "title")?)?;
        let duration_hours = submission
            .duration_hours
            .as_ref()
            .ok_or(ValidationError::MissingField("duration_hours"))
            .and_then(validation::parse_duration_hours)?;
        let certificate_type = validation::parse_certificate_type(required(
            &submission.certificate_type,
            "certificate_type",
        )?)?;

        let course = self.store.insert_course(CourseDraft {
            title,
            duration_hours,
            certificate_type,
            created_at: Utc::now(),
        })?;

        info!(
            course_id = %course.id,
            duration_hours = course.duration_hours,
            "course created"
        );
        Ok(course.to_view())
    }

    pub fn courses(&self, visibility: Visibility) -> Result<Vec<CourseView>, TrainingServiceError> {
        let courses = self.store.courses(visibility)?;
        Ok(courses.iter().map(Course::to_view).collect())
    }

    pub fn course(&self, id: CourseId) -> Result<CourseView, TrainingServiceError> {
        Ok(self.fetch_course(id)?.to_view())
    }

    pub fn delete_course(&self, id: CourseId) -> Result<CourseView, TrainingServiceError> {
        let now = Utc::now();
        let (deleted, view) = self
            .store
            .modify_course(id, |course| {
                Ok::<_, TrainingServiceError>((course.lifecycle.soft_delete(now), course.to_view()))
            })
            .map_err(|err| err.or_not_found(RecordKind::Course, id.0))?;
        if deleted {
            info!(course_id = %id, "course deleted");
        }
        Ok(view)
    }

    pub fn registrations(
        &self,
        visibility: Visibility,
    ) -> Result<Vec<RegistrationView>, TrainingServiceError> {
        let registrations = self.store.registrations(visibility)?;
        let employees: HashMap<EmployeeId, Employee> = self
            .store
            .employees(Visibility::Active)?
            .into_iter()
            .chain(self.store.employees(Visibility::Deleted)?)
            .map(|employee| (employee.id, employee))
            .collect();
        let courses: HashMap<CourseId, Course> = self
            .store
            .courses(Visibility::Active)?
            .into_iter()
            .chain(self.store.courses(Visibility::Deleted)?)
            .map(|course| (course.id, course))
            .collect();

        Ok(registrations
            .iter()
            .map(|registration| {
                registration.to_view(
                    employees.get(&registration.employee_id),
                    courses.get(&registration.course_id),
                )
            })
            .collect())
    }

    /// Enrolls an active employee in an active course; the new registration starts as `enrolled`.
    pub fn enroll(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<RegistrationView, TrainingServiceError> {
        let employee_id = submission
            .employee_id
            .map(EmployeeId)
            .ok_or(ValidationError::MissingField("employee_id"))?;
        let course_id = submission
            .course_id
            .map(CourseId)
            .ok_or(ValidationError::MissingField("course_id"))?;

        let employee = self.fetch_active_employee(employee_id)?;
        let course = self.fetch_active_course(course_id)?;

        let registration = self.store.insert_registration(RegistrationDraft {
            employee_id,
            course_id,
            registered_at: Utc::now(),
        })?;

        info!(
            registration_id = %registration.id,
            employee_id = %employee_id,
            course_id = %course_id,
            "employee enrolled"
        );
        Ok(registration.to_view(Some(&employee), Some(&course)))
    }

    pub fn registration(&self, id: RegistrationId) -> Result<RegistrationView, TrainingServiceError> {
        let registration = self.fetch_registration(id)?;
        self.registration_view(&registration)
    }

    pub fn update_status(
        &self,
        id: RegistrationId,
        status: &str,
    ) -> Result<RegistrationView, TrainingServiceError> {
        let target = validation::parse_status(status)?;
        let now = Utc::now();
        let (previous, registration) = self.change_registration(id, |registration| {
            let previous = registration.status;
            registration.advance(target, now)?;
            Ok(previous)
        })?;

        info!(
            registration_id = %id,
            from = previous.label(),
            to = target.label(),
            "registration status changed"
        );
        self.registration_view(&registration)
    }

    pub fn update_progress(
        &self,
        id: RegistrationId,
        progress: i64,
    ) -> Result<RegistrationView, TrainingServiceError> {
        let progress = ProgressPercent::new(progress)?;
        let now = Utc::now();
        let (change, registration) = self.change_registration(id, |registration| {
            Ok(registration.record_progress(progress, now)?)
        })?;

        info!(
            registration_id = %id,
            progress_percent = progress.value(),
            started = (change == ProgressChange::Started),
            "registration progress recorded"
        );
        self.registration_view(&registration)
    }

    pub fn delete_registration(
        &self,
        id: RegistrationId,
    ) -> Result<RegistrationView, TrainingServiceError> {
        let now = Utc::now();
        let (deleted, registration) = self.change_registration(id, |registration| {
            Ok(registration.lifecycle.soft_delete(now))
        })?;
        if deleted {
            info!(registration_id = %id, "registration deleted");
        }
        self.registration_view(&registration)
    }

    pub fn statistics(&self) -> Result<TrainingStatistics, TrainingServiceError> {
        self.statistics_at(Utc::now())
    }

    pub fn statistics_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<TrainingStatistics, TrainingServiceError> {
        let employees = self.store.employees(Visibility::Active)?;
        let courses = self.store.courses(Visibility::Active)?;
        let registrations = self.store.registrations(Visibility::Active)?;
        Ok(TrainingStatistics::collect(
            &employees,
            &courses,
            &registrations,
            now,
            &self.report,
        ))
    }

    pub fn csv_report(&self) -> Result<RenderedReport, TrainingServiceError> {
        let stats = self.statistics()?;
        Ok(RenderedReport {
            filename: report::csv_filename().to_string(),
            body: report::render_csv(&stats)?,
        })
    }

    pub fn html_report(&self) -> Result<RenderedReport, TrainingServiceError> {
        let stats = self.statistics()?;
        Ok(RenderedReport {
            filename: report::html_filename(stats.generated_at),
            body: report::render_html(&stats)?,
        })
    }

    pub fn recommendations(&self) -> Result<Vec<Recommendation>, TrainingServiceError> {
        Ok(self.statistics()?.recommendations())
    }

    fn registration_view(
        &self,
        registration: &Registration,
    ) -> Result<RegistrationView, TrainingServiceError> {
        let employee = self.store.employee(registration.employee_id)?;
        let course = self.store.course(registration.course_id)?;
        Ok(registration.to_view(employee.as_ref(), course.as_ref()))
    }

    fn fetch_employee(&self, id: EmployeeId) -> Result<Employee, TrainingServiceError> {
        self.store
            .employee(id)?
            .ok_or(TrainingServiceError::not_found(RecordKind::Employee, id.0))
    }

    fn fetch_active_employee(&self, id: EmployeeId) -> Result<Employee, TrainingServiceError> {
        let employee = self.fetch_employee(id)?;
        if employee.lifecycle.is_active() {
            Ok(employee)
        } else {
            Err(TrainingServiceError::not_found(RecordKind::Employee, id.0))
        }
    }

    fn fetch_course(&self, id: CourseId) -> Result<Course, TrainingServiceError> {
        self.store
            .course(id)?
            .ok_or(TrainingServiceError::not_found(RecordKind::Course, id.0))
    }

    fn fetch_active_course(&self, id: CourseId) -> Result<Course, TrainingServiceError> {
        let course = self.fetch_course(id)?;
        if course.lifecycle.is_active() {
            Ok(course)
        } else {
            Err(TrainingServiceError::not_found(RecordKind::Course, id.0))
        }
    }

    /// Runs `change` under the store's write lock and returns its outcome with the stored record.
    fn change_registration<T>(
        &self,
        id: RegistrationId,
        change: impl FnOnce(&mut Registration) -> Result<T, TrainingServiceError>,
    ) -> Result<(T, Registration), TrainingServiceError> {
        self.store
            .modify_registration(id, |registration| -> Result<_, TrainingServiceError> {
                let outcome = change(registration)?;
                Ok((outcome, registration.clone()))
            })
            .map_err(|err| err.or_not_found(RecordKind::Registration, id.0))
    }

    fn fetch_registration(&self, id: RegistrationId) -> Result<Registration, TrainingServiceError> {
        self.store
            .registration(id)?
            .ok_or(TrainingServiceError::not_found(RecordKind::Registration, id.0))
    }
}

/// Error raised by the training service.
#[derive(Debug, thiserror::Error)]
pub enum TrainingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("{0}")]
    Duplicate(UniqueKey),
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: u64 },
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl TrainingServiceError {
    pub const fn not_found(kind: RecordKind, id: u64) -> Self {
        Self::NotFound { kind, id }
    }

    /// Turns a store miss into a not-found error naming the record.
    fn or_not_found(self, kind: RecordKind, id: u64) -> Self {
        match self {
            Self::Store(StoreError::NotFound) => Self::not_found(kind, id),
            other => other,
        }
    }

    /// Whether the failure was caused by the request rather than by the service.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Report(_))
    }
}

impl From<StoreError> for TrainingServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(key) => Self::Duplicate(key),
            other => Self::Store(other),
        }
    }
}
