use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Course, CourseDraft, CourseId, Employee, EmployeeDraft, EmployeeId, Lifecycle,
    ProgressPercent, Registration, RegistrationDraft, RegistrationId, RegistrationStatus,
    Visibility,
};
use super::validation::normalize_phone;

/// Storage abstraction handed to the service so each instance owns its own records.
///
/// Inserts enforce the uniqueness rules among active records as part of the write itself;
/// listings always take a [`Visibility`] so callers choose a side of the soft-delete flag.
///
/// The `modify_*` methods run `change` against the stored record while holding the write
/// side, so the check a change makes and the write it produces cannot interleave with another
/// writer. The record is replaced only when `change` returns `Ok`; a missing id yields
/// [`StoreError::NotFound`].
pub trait RecordStore: Send + Sync {
    fn insert_employee(&self, draft: EmployeeDraft) -> Result<Employee, StoreError>;
    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
    fn employees(&self, visibility: Visibility) -> Result<Vec<Employee>, StoreError>;
    fn modify_employee<T, E>(
        &self,
        id: EmployeeId,
        change: impl FnOnce(&mut Employee) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;

    fn insert_course(&self, draft: CourseDraft) -> Result<Course, StoreError>;
    fn course(&self, id: CourseId) -> Result<Option<Course>, StoreError>;
    fn courses(&self, visibility: Visibility) -> Result<Vec<Course>, StoreError>;
    fn modify_course<T, E>(
        &self,
        id: CourseId,
        change: impl FnOnce(&mut Course) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;

    fn insert_registration(&self, draft: RegistrationDraft) -> Result<Registration, StoreError>;
    fn registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError>;
    fn registrations(&self, visibility: Visibility) -> Result<Vec<Registration>, StoreError>;
    fn modify_registration<T, E>(
        &self,
        id: RegistrationId,
        change: impl FnOnce(&mut Registration) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate record: {0}")]
    Duplicate(UniqueKey),
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Uniqueness rules scoped to active records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    EmployeePhone,
    EmployeeNameAndPosition,
    CourseTitle,
    EmployeeCourse,
}

impl UniqueKey {
    pub const fn conflict_message(self) -> &'static str {
        match self {
            Self::EmployeePhone => "an employee with this phone number already exists",
            Self::EmployeeNameAndPosition => {
                "an employee with this full name and position already exists"
            }
            Self::CourseTitle => "a course with this title already exists",
            Self::EmployeeCourse => "the employee is already enrolled in this course",
        }
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.conflict_message())
    }
}

/// Process-local store. One lock guards all tables, so a uniqueness check and the insert
/// that follows it cannot interleave with another writer.
#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    employees: BTreeMap<EmployeeId, Employee>,
    courses: BTreeMap<CourseId, Course>,
    registrations: BTreeMap<RegistrationId, Registration>,
    last_employee_id: u64,
    last_course_id: u64,
    last_registration_id: u64,
}

fn next_id(last: &mut u64) -> u64 {
    *last += 1;
    *last
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))
    }
}

fn visible<T: Clone>(
    records: &BTreeMap<impl Ord, T>,
    visibility: Visibility,
    lifecycle: impl Fn(&T) -> &Lifecycle,
) -> Vec<T> {
    records
        .values()
        .filter(|record| visibility.matches(lifecycle(record)))
        .cloned()
        .collect()
}

/// Stages the change on a copy so a failed change leaves the stored record untouched.
fn apply<R: Clone, T, E>(
    slot: Option<&mut R>,
    change: impl FnOnce(&mut R) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StoreError>,
{
    let stored = slot.ok_or(StoreError::NotFound)?;
    let mut staged = stored.clone();
    let outcome = change(&mut staged)?;
    *stored = staged;
    Ok(outcome)
}

impl RecordStore for InMemoryRecordStore {
    fn insert_employee(&self, draft: EmployeeDraft) -> Result<Employee, StoreError> {
        let mut tables = self.tables()?;
        let phone = normalize_phone(&draft.phone);
        let active = || tables.employees.values().filter(|e| e.lifecycle.is_active());

        if active().any(|existing| existing.normalized_phone() == phone) {
            return Err(StoreError::Duplicate(UniqueKey::EmployeePhone));
        }
        if active().any(|existing| {
            existing.full_name == draft.full_name && existing.position == draft.position
        }) {
            return Err(StoreError::Duplicate(UniqueKey::EmployeeNameAndPosition));
        }

        let employee = Employee {
            id: EmployeeId(next_id(&mut tables.last_employee_id)),
            full_name: draft.full_name,
            phone: draft.phone,
            position: draft.position,
            created_at: draft.created_at,
            lifecycle: Lifecycle::Active,
        };
        tables.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.tables()?.employees.get(&id).cloned())
    }

    fn employees(&self, visibility: Visibility) -> Result<Vec<Employee>, StoreError> {
        let tables = self.tables()?;
        Ok(visible(&tables.employees, visibility, |e| &e.lifecycle))
    }

    fn modify_employee<T, E>(
        &self,
        id: EmployeeId,
        change: impl FnOnce(&mut Employee) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self.tables()?;
        apply(tables.employees.get_mut(&id), change)
    }

    fn insert_course(&self, draft: CourseDraft) -> Result<Course, StoreError> {
        let mut tables = self.tables()?;
        let taken = tables
            .courses
            .values()
            .any(|existing| existing.lifecycle.is_active() && existing.title == draft.title);
        if taken {
            return Err(StoreError::Duplicate(UniqueKey::CourseTitle));
        }

        let course = Course {
            id: CourseId(next_id(&mut tables.last_course_id)),
            title: draft.title,
            duration_hours: draft.duration_hours,
            certificate_type: draft.certificate_type,
            created_at: draft.created_at,
            lifecycle: Lifecycle::Active,
        };
        tables.courses.insert(course.id, course.clone());
        Ok(course)
    }

    fn course(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        Ok(self.tables()?.courses.get(&id).cloned())
    }

    fn courses(&self, visibility: Visibility) -> Result<Vec<Course>, StoreError> {
        let tables = self.tables()?;
        Ok(visible(&tables.courses, visibility, |c| &c.lifecycle))
    }

    fn modify_course<T, E>(
        &self,
        id: CourseId,
        change: impl FnOnce(&mut Course) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self.tables()?;
        apply(tables.courses.get_mut(&id), change)
    }

    fn insert_registration(&self, draft: RegistrationDraft) -> Result<Registration, StoreError> {
        let mut tables = self.tables()?;
        let taken = tables.registrations.values().any(|existing| {
            existing.lifecycle.is_active()
                && existing.employee_id == draft.employee_id
                && existing.course_id == draft.course_id
        });
        if taken {
            return Err(StoreError::Duplicate(UniqueKey::EmployeeCourse));
        }

        let registration = Registration {
            id: RegistrationId(next_id(&mut tables.last_registration_id)),
            employee_id: draft.employee_id,
            course_id: draft.course_id,
            status: RegistrationStatus::Enrolled,
            registered_at: draft.registered_at,
            started_at: None,
            completed_at: None,
            progress: ProgressPercent::ZERO,
            lifecycle: Lifecycle::Active,
        };
        tables
            .registrations
            .insert(registration.id, registration.clone());
        Ok(registration)
    }

    fn registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
        Ok(self.tables()?.registrations.get(&id).cloned())
    }

    fn registrations(&self, visibility: Visibility) -> Result<Vec<Registration>, StoreError> {
        let tables = self.tables()?;
        Ok(visible(&tables.registrations, visibility, |r| &r.lifecycle))
    }

    fn modify_registration<T, E>(
        &self,
        id: RegistrationId,
        change: impl FnOnce(&mut Registration) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self.tables()?;
        apply(tables.registrations.get_mut(&id), change)
    }
}
