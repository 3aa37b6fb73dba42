//! Employee training records: employees, courses, enrollments and the reports built on them.
//!
//! Records live behind [`RecordStore`]; [`TrainingService`] validates input, drives the
//! enrollment lifecycle and aggregates statistics, and [`training_router`] exposes it over HTTP.

pub mod domain;
pub mod lifecycle;
pub mod report;
pub mod router;
pub mod seed;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    CertificateType, Course, CourseId, CourseSubmission, CourseView, Employee, EmployeeId,
    EmployeeSubmission, EmployeeView, Lifecycle, Position, ProgressPercent, Registration,
    RegistrationId, RegistrationStatus, RegistrationSubmission, RegistrationView, Visibility,
};
pub use lifecycle::{LifecycleError, ProgressChange};
pub use report::{
    Recommendation, ReportConfig, ReportError, StatisticsView, TrainingStatistics,
};
pub use router::training_router;
pub use service::{RecordKind, RenderedReport, TrainingService, TrainingServiceError};
pub use store::{InMemoryRecordStore, RecordStore, StoreError, UniqueKey};
pub use validation::ValidationError;
