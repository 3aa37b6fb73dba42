use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::validation::{self, ValidationError};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Store-assigned identifier for employees.
    EmployeeId
);
record_id!(
    /// Store-assigned identifier for courses.
    CourseId
);
record_id!(
    /// Store-assigned identifier for course registrations.
    RegistrationId
);

/// Job positions an employee may hold. The labels are the accepted input values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Analyst,
    Developer,
    Tester,
    ProjectManager,
    SystemAdministrator,
    Designer,
    SoftwareArchitect,
}

impl Position {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Analyst,
            Self::Developer,
            Self::Tester,
            Self::ProjectManager,
            Self::SystemAdministrator,
            Self::Designer,
            Self::SoftwareArchitect,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Analyst => "Аналитик",
            Self::Developer => "Разработчик",
            Self::Tester => "Тестировщик",
            Self::ProjectManager => "Менеджер проекта",
            Self::SystemAdministrator => "Системный администратор",
            Self::Designer => "Дизайнер",
            Self::SoftwareArchitect => "Архитектор ПО",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|position| position.label() == raw)
    }

    pub fn options() -> String {
        join_labels(Self::ordered().map(Self::label))
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Kind of document issued when a course is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateType {
    Diploma,
    Certificate,
    Credential,
    Attestation,
}

impl CertificateType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Diploma,
            Self::Certificate,
            Self::Credential,
            Self::Attestation,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Diploma => "Диплом",
            Self::Certificate => "Сертификат",
            Self::Credential => "Удостоверение",
            Self::Attestation => "Свидетельство",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|kind| kind.label() == raw)
    }

    pub fn options() -> String {
        join_labels(Self::ordered().map(Self::label))
    }
}

impl Serialize for CertificateType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Enrollment status of a registration. Transitions are governed by `lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Enrolled,
    InProgress,
    Completed,
}

impl RegistrationStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Enrolled, Self::InProgress, Self::Completed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Enrolled => "enrolled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|status| status.label() == raw)
    }

    pub fn options() -> String {
        join_labels(Self::ordered().map(Self::label))
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn join_labels<const N: usize>(labels: [&'static str; N]) -> String {
    labels.join(", ")
}

/// Soft-delete state carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted { deleted_at: DateTime<Utc> },
}

impl Lifecycle {
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_deleted(&self) -> bool {
        !self.is_active()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { deleted_at } => Some(*deleted_at),
        }
    }

    /// Marks the record deleted. Returns `false` when it already was, keeping the first timestamp.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Active => {
                *self = Self::Deleted { deleted_at: now };
                true
            }
            Self::Deleted { .. } => false,
        }
    }
}

/// Which side of the soft-delete flag a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Active,
    Deleted,
}

impl Visibility {
    pub const fn from_deleted_flag(deleted: bool) -> Self {
        if deleted {
            Self::Deleted
        } else {
            Self::Active
        }
    }

    pub const fn matches(self, lifecycle: &Lifecycle) -> bool {
        match self {
            Self::Active => lifecycle.is_active(),
            Self::Deleted => lifecycle.is_deleted(),
        }
    }
}

/// Course progress in whole percent, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProgressPercent(u8);

impl ProgressPercent {
    pub const COMPLETE: Self = Self(100);
    pub const ZERO: Self = Self(0);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        validation::validate_progress(value).map(Self)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub phone: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl Employee {
    pub fn normalized_phone(&self) -> String {
        validation::normalize_phone(&self.phone)
    }

    pub fn to_view(&self) -> EmployeeView {
        EmployeeView {
            id: self.id,
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            position: self.position,
            created_at: self.created_at,
            is_deleted: self.lifecycle.is_deleted(),
            deleted_at: self.lifecycle.deleted_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub duration_hours: u16,
    pub certificate_type: CertificateType,
    pub created_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl Course {
    pub fn to_view(&self) -> CourseView {
        CourseView {
            id: self.id,
            title: self.title.clone(),
            duration_hours: self.duration_hours,
            certificate_type: self.certificate_type,
            created_at: self.created_at,
            is_deleted: self.lifecycle.is_deleted(),
            deleted_at: self.lifecycle.deleted_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: RegistrationId,
    pub employee_id: EmployeeId,
    pub course_id: CourseId,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: ProgressPercent,
    pub lifecycle: Lifecycle,
}

impl Registration {
    pub fn to_view(
        &self,
        employee: Option<&Employee>,
        course: Option<&Course>,
    ) -> RegistrationView {
        RegistrationView {
            id: self.id,
            employee_id: self.employee_id,
            employee_name: employee.map(|employee| employee.full_name.clone()),
            course_id: self.course_id,
            course_title: course.map(|course| course.title.clone()),
            status: self.status,
            registered_at: self.registered_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            progress_percent: self.progress.value(),
            is_deleted: self.lifecycle.is_deleted(),
            deleted_at: self.lifecycle.deleted_at(),
        }
    }
}

/// Raw employee payload as received from callers; validated by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSubmission {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Raw course payload. `duration_hours` may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSubmission {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_hours: Option<serde_json::Value>,
    #[serde(default)]
    pub certificate_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSubmission {
    #[serde(default)]
    pub employee_id: Option<u64>,
    #[serde(default)]
    pub course_id: Option<u64>,
}

/// Validated employee fields ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub full_name: String,
    pub phone: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub duration_hours: u16,
    pub certificate_type: CertificateType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub employee_id: EmployeeId,
    pub course_id: CourseId,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeView {
    pub id: EmployeeId,
    pub full_name: String,
    pub phone: String,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseView {
    pub id: CourseId,
    pub title: String,
    pub duration_hours: u16,
    pub certificate_type: CertificateType,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationView {
    pub id: RegistrationId,
    pub employee_id: EmployeeId,
    pub employee_name: Option<String>,
    pub course_id: CourseId,
    pub course_title: Option<String>,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress_percent: u8,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn labels_round_trip_through_lookup() {
        for position in Position::ordered() {
            assert_eq!(Position::from_label(position.label()), Some(position));
        }
        for kind in CertificateType::ordered() {
            assert_eq!(CertificateType::from_label(kind.label()), Some(kind));
        }
        assert_eq!(Position::from_label("Супергерой"), None);
        assert_eq!(CertificateType::from_label("сертификат"), None);
    }

    #[test]
    fn soft_delete_keeps_first_timestamp() {
        let mut lifecycle = Lifecycle::Active;
        assert!(lifecycle.soft_delete(at(9)));
        assert!(!lifecycle.soft_delete(at(11)));
        assert_eq!(lifecycle.deleted_at(), Some(at(9)));
    }

    #[test]
    fn visibility_selects_matching_side_of_flag() {
        let deleted = Lifecycle::Deleted { deleted_at: at(8) };
        assert!(Visibility::Active.matches(&Lifecycle::Active));
        assert!(!Visibility::Active.matches(&deleted));
        assert!(Visibility::Deleted.matches(&deleted));
        assert_eq!(Visibility::from_deleted_flag(true), Visibility::Deleted);
    }

    #[test]
    fn employee_view_serializes_labels() {
        let employee = Employee {
            id: EmployeeId(4),
            full_name: "Иван Иванов".to_string(),
            phone: "+7 (999) 123-45-67".to_string(),
            position: Position::Developer,
            created_at: at(10),
            lifecycle: Lifecycle::Active,
        };

        let json = serde_json::to_value(employee.to_view()).expect("serializes");
        assert_eq!(json["id"], 4);
        assert_eq!(json["position"], "Разработчик");
        assert_eq!(json["is_deleted"], false);
        assert!(json.get("deleted_at").is_none());
        assert_eq!(employee.normalized_phone(), "79991234567");
    }
}
