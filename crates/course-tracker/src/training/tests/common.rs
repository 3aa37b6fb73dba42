use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::training::domain::{
    Course, CourseDraft, CourseId, CourseSubmission, Employee, EmployeeDraft, EmployeeId,
    EmployeeSubmission, Registration, RegistrationDraft, RegistrationId, RegistrationSubmission,
    Visibility,
};
use crate::training::report::ReportConfig;
use crate::training::store::{InMemoryRecordStore, RecordStore, StoreError};
use crate::training::{training_router, TrainingService};

pub(super) fn build_service() -> (TrainingService<InMemoryRecordStore>, Arc<InMemoryRecordStore>) {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = TrainingService::new(store.clone(), ReportConfig::default());
    (service, store)
}

pub(super) fn employee_submission(
    full_name: &str,
    phone: &str,
    position: &str,
) -> EmployeeSubmission {
    EmployeeSubmission {
        full_name: Some(full_name.to_string()),
        phone: Some(phone.to_string()),
        position: Some(position.to_string()),
    }
}

pub(super) fn ivan() -> EmployeeSubmission {
    employee_submission("Иван Иванов", "+79991234567", "Разработчик")
}

pub(super) fn course_submission(title: &str, hours: Value, certificate: &str) -> CourseSubmission {
    CourseSubmission {
        title: Some(title.to_string()),
        duration_hours: Some(hours),
        certificate_type: Some(certificate.to_string()),
    }
}

pub(super) fn python_course() -> CourseSubmission {
    course_submission("Python для начинающих", json!(40), "Сертификат")
}

pub(super) fn enrollment(employee: EmployeeId, course: CourseId) -> RegistrationSubmission {
    RegistrationSubmission {
        employee_id: Some(employee.0),
        course_id: Some(course.0),
    }
}

pub(super) fn router_with_service(service: TrainingService<InMemoryRecordStore>) -> axum::Router {
    training_router(Arc::new(service))
}

pub(super) fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose backend is always down.
pub(super) struct UnavailableStore;

fn outage() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

fn offline<T>() -> Result<T, StoreError> {
    Err(outage())
}

impl RecordStore for UnavailableStore {
    fn insert_employee(&self, _draft: EmployeeDraft) -> Result<Employee, StoreError> {
        offline()
    }

    fn employee(&self, _id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        offline()
    }

    fn employees(&self, _visibility: Visibility) -> Result<Vec<Employee>, StoreError> {
        offline()
    }

    fn modify_employee<T, E>(
        &self,
        _id: EmployeeId,
        _change: impl FnOnce(&mut Employee) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        Err(outage().into())
    }

    fn insert_course(&self, _draft: CourseDraft) -> Result<Course, StoreError> {
        offline()
    }

    fn course(&self, _id: CourseId) -> Result<Option<Course>, StoreError> {
        offline()
    }

    fn courses(&self, _visibility: Visibility) -> Result<Vec<Course>, StoreError> {
        offline()
    }

    fn modify_course<T, E>(
        &self,
        _id: CourseId,
        _change: impl FnOnce(&mut Course) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        Err(outage().into())
    }

    fn insert_registration(&self, _draft: RegistrationDraft) -> Result<Registration, StoreError> {
        offline()
    }

    fn registration(&self, _id: RegistrationId) -> Result<Option<Registration>, StoreError> {
        offline()
    }

    fn registrations(&self, _visibility: Visibility) -> Result<Vec<Registration>, StoreError> {
        offline()
    }

    fn modify_registration<T, E>(
        &self,
        _id: RegistrationId,
        _change: impl FnOnce(&mut Registration) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        Err(outage().into())
    }
}
