use super::common::*;
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;

use crate::training::domain::{
    CourseId, EmployeeId, RegistrationId, RegistrationStatus, RegistrationSubmission, Visibility,
};
use crate::training::lifecycle::LifecycleError;
use crate::training::seed::seed_demo_dataset;
use crate::training::store::{InMemoryRecordStore, RecordStore, UniqueKey};
use crate::training::validation::ValidationError;
use crate::training::{RecordKind, ReportConfig, TrainingService, TrainingServiceError};

#[test]
fn create_employee_trims_name_and_keeps_phone_as_submitted() {
    let (service, _) = build_service();

    let employee = service
        .create_employee(employee_submission(
            "  Мария Петрова ",
            " +7 (999) 555-66-77 ",
            "Аналитик",
        ))
        .expect("employee is valid");

    assert_eq!(employee.id, EmployeeId(1));
    assert_eq!(employee.full_name, "Мария Петрова");
    assert_eq!(employee.phone, "+7 (999) 555-66-77");
    assert!(!employee.is_deleted);
}

#[test]
fn duplicate_normalized_phone_is_rejected() {
    let (service, _) = build_service();
    service.create_employee(ivan()).expect("first employee");

    let err = service
        .create_employee(employee_submission(
            "Петр Петров",
            "+7 (999) 123-45-67",
            "Тестировщик",
        ))
        .expect_err("phone already taken");

    assert!(matches!(
        err,
        TrainingServiceError::Duplicate(UniqueKey::EmployeePhone)
    ));
    assert!(err.to_string().contains("phone"));
    assert!(err.is_client_error());
}

#[test]
fn duplicate_name_and_position_is_rejected() {
    let (service, _) = build_service();
    service.create_employee(ivan()).expect("first employee");

    let err = service
        .create_employee(employee_submission(
            "Иван Иванов",
            "+79990001122",
            "Разработчик",
        ))
        .expect_err("same person twice");
    assert!(matches!(
        err,
        TrainingServiceError::Duplicate(UniqueKey::EmployeeNameAndPosition)
    ));

    service
        .create_employee(employee_submission(
            "Иван Иванов",
            "+79990001122",
            "Тестировщик",
        ))
        .expect("same name with another position is a different employee");
}

#[test]
fn employee_validation_errors_surface_field_rules() {
    let (service, _) = build_service();

    let missing = service
        .create_employee(employee_submission("Иван Иванов", "  ", "Разработчик"))
        .expect_err("phone missing");
    assert!(matches!(
        missing,
        TrainingServiceError::Validation(ValidationError::MissingField("phone"))
    ));

    let bad_position = service
        .create_employee(employee_submission("Иван Иванов", "+79991234567", "Стажер"))
        .expect_err("unknown position");
    assert!(bad_position.to_string().contains("Архитектор ПО"));

    let bad_name = service
        .create_employee(employee_submission("R2D2", "+79991234567", "Разработчик"))
        .expect_err("digits in name");
    assert!(matches!(
        bad_name,
        TrainingServiceError::Validation(ValidationError::InvalidFullName)
    ));
}

#[test]
fn course_accepts_numeric_string_duration_and_rejects_duplicate_titles() {
    let (service, _) = build_service();

    let course = service
        .create_course(course_submission("  Git и GitHub ", json!("8"), "Сертификат"))
        .expect("course is valid");
    assert_eq!(course.title, "Git и GitHub");
    assert_eq!(course.duration_hours, 8);

    let err = service
        .create_course(course_submission("Git и GitHub", json!(12), "Диплом"))
        .expect_err("title taken");
    assert!(matches!(
        err,
        TrainingServiceError::Duplicate(UniqueKey::CourseTitle)
    ));

    let err = service
        .create_course(course_submission("Rust", json!(0), "Диплом"))
        .expect_err("duration out of range");
    assert!(matches!(
        err,
        TrainingServiceError::Validation(ValidationError::InvalidDuration)
    ));
}

#[test]
fn enrollment_requires_active_employee_and_course() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");

    let missing = service
        .enroll(RegistrationSubmission {
            employee_id: Some(employee.id.0),
            course_id: None,
        })
        .expect_err("course id missing");
    assert!(matches!(
        missing,
        TrainingServiceError::Validation(ValidationError::MissingField("course_id"))
    ));

    let unknown = service
        .enroll(enrollment(EmployeeId(42), course.id))
        .expect_err("unknown employee");
    assert!(matches!(
        unknown,
        TrainingServiceError::NotFound {
            kind: RecordKind::Employee,
            id: 42
        }
    ));

    service.delete_course(course.id).expect("delete course");
    let deleted = service
        .enroll(enrollment(employee.id, course.id))
        .expect_err("course is deleted");
    assert!(matches!(
        deleted,
        TrainingServiceError::NotFound {
            kind: RecordKind::Course,
            ..
        }
    ));
}

#[test]
fn duplicate_enrollment_is_rejected_until_the_first_is_deleted() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");

    let first = service
        .enroll(enrollment(employee.id, course.id))
        .expect("first enrollment");
    let err = service
        .enroll(enrollment(employee.id, course.id))
        .expect_err("already enrolled");
    assert!(matches!(
        err,
        TrainingServiceError::Duplicate(UniqueKey::EmployeeCourse)
    ));

    service.delete_registration(first.id).expect("delete");
    service
        .enroll(enrollment(employee.id, course.id))
        .expect("re-enrollment after delete");
}

#[test]
fn full_lifecycle_updates_statistics() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");

    let registration = service
        .enroll(enrollment(employee.id, course.id))
        .expect("enroll");
    assert_eq!(registration.status, RegistrationStatus::Enrolled);
    assert_eq!(registration.progress_percent, 0);
    assert_eq!(registration.employee_name.as_deref(), Some("Иван Иванов"));
    assert_eq!(
        registration.course_title.as_deref(),
        Some("Python для начинающих")
    );

    let started = service
        .update_status(registration.id, "in_progress")
        .expect("start");
    assert!(started.started_at.is_some());

    let completed = service
        .update_status(registration.id, "completed")
        .expect("complete");
    assert_eq!(completed.status, RegistrationStatus::Completed);
    assert_eq!(completed.progress_percent, 100);
    assert!(completed.completed_at.is_some());

    let summary = service.statistics().expect("statistics").summary();
    assert_eq!(summary.by_status.completed, 1);
    assert_eq!(summary.total_registrations, 1);
    assert_eq!(summary.completion_rate_percent, 100.0);
}

#[test]
fn completing_fresh_registration_fails_and_keeps_status() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");
    let registration = service
        .enroll(enrollment(employee.id, course.id))
        .expect("enroll");

    let err = service
        .update_status(registration.id, "completed")
        .expect_err("cannot skip in_progress");
    assert!(matches!(
        err,
        TrainingServiceError::Lifecycle(LifecycleError::IllegalTransition { .. })
    ));

    let unchanged = service.registration(registration.id).expect("fetch");
    assert_eq!(unchanged.status, RegistrationStatus::Enrolled);
    assert!(unchanged.completed_at.is_none());

    let unknown = service
        .update_status(registration.id, "finished")
        .expect_err("unknown status");
    assert!(unknown.to_string().contains("in_progress"));
}

#[test]
fn progress_auto_advances_enrolled_registration() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");
    let registration = service
        .enroll(enrollment(employee.id, course.id))
        .expect("enroll");

    let updated = service
        .update_progress(registration.id, 25)
        .expect("progress accepted");
    assert_eq!(updated.status, RegistrationStatus::InProgress);
    assert_eq!(updated.progress_percent, 25);
    assert!(updated.started_at.is_some());

    let err = service
        .update_progress(registration.id, 150)
        .expect_err("out of range");
    assert!(matches!(
        err,
        TrainingServiceError::Validation(ValidationError::ProgressOutOfRange(150))
    ));
}

#[test]
fn soft_deleted_employee_leaves_listings_but_stays_retrievable() {
    let (service, _) = build_service();
    let ivan = service.create_employee(ivan()).expect("employee");
    service
        .create_employee(employee_submission(
            "Мария Петрова",
            "+79995556677",
            "Аналитик",
        ))
        .expect("employee");

    let deleted = service.delete_employee(ivan.id).expect("delete");
    assert!(deleted.is_deleted);
    let first_deleted_at = deleted.deleted_at.expect("timestamp recorded");

    let active = service.employees(Visibility::Active).expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].full_name, "Мария Петрова");

    let archived = service.employees(Visibility::Deleted).expect("list");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, ivan.id);

    let fetched = service.employee(ivan.id).expect("fetch by id");
    assert!(fetched.is_deleted);

    let again = service.delete_employee(ivan.id).expect("repeat delete");
    assert_eq!(again.deleted_at, Some(first_deleted_at));

    assert!(service
        .search_employees("иван", Visibility::Active)
        .expect("search")
        .is_empty());
    assert_eq!(
        service
            .search_employees("иван", Visibility::Deleted)
            .expect("search")
            .len(),
        1
    );
}

#[test]
fn search_matches_name_case_insensitively_or_phone_substring() {
    let (service, _) = build_service();
    service.create_employee(ivan()).expect("employee");
    service
        .create_employee(employee_submission(
            "Мария Петрова",
            "+79995556677",
            "Аналитик",
        ))
        .expect("employee");

    let by_name = service
        .search_employees("ПЕТРОВА", Visibility::Active)
        .expect("search");
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].full_name, "Мария Петрова");

    let by_phone = service
        .search_employees("1234", Visibility::Active)
        .expect("search");
    assert_eq!(by_phone.len(), 1);
    assert_eq!(by_phone[0].full_name, "Иван Иванов");

    assert!(matches!(
        service.search_employees("   ", Visibility::Active),
        Err(TrainingServiceError::Validation(
            ValidationError::EmptySearchQuery
        ))
    ));
}

#[test]
fn deleted_registration_rejects_updates_and_leaves_statistics() {
    let (service, store) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");
    let registration = service
        .enroll(enrollment(employee.id, course.id))
        .expect("enroll");

    service
        .delete_registration(registration.id)
        .expect("delete");

    assert!(matches!(
        service.update_progress(registration.id, 50),
        Err(TrainingServiceError::Lifecycle(LifecycleError::Deleted(_)))
    ));
    assert!(matches!(
        service.update_status(registration.id, "in_progress"),
        Err(TrainingServiceError::Lifecycle(LifecycleError::Deleted(_)))
    ));

    let stored = store
        .registration(registration.id)
        .expect("store reachable")
        .expect("record kept");
    assert_eq!(stored.status, RegistrationStatus::Enrolled);

    let stats = service.statistics().expect("statistics");
    assert_eq!(stats.total_registrations, 0);
    assert_eq!(stats.employees_without_registrations, 1);
    assert!(service
        .registrations(Visibility::Active)
        .expect("list")
        .is_empty());
    assert_eq!(
        service
            .registrations(Visibility::Deleted)
            .expect("list")
            .len(),
        1
    );
}

#[test]
fn demo_dataset_statistics_and_recommendations() {
    let (service, _) = build_service();
    let summary = seed_demo_dataset(&service).expect("seed loads");
    assert_eq!(summary.employees, 7);
    assert_eq!(summary.courses, 6);
    assert_eq!(summary.registrations, 10);

    let stats = service.statistics().expect("statistics");
    let view = stats.summary();
    assert_eq!(view.total_employees, 7);
    assert_eq!(view.total_courses, 6);
    assert_eq!(view.total_registrations, 10);
    assert_eq!(view.by_status.enrolled, 3);
    assert_eq!(view.by_status.in_progress, 4);
    assert_eq!(view.by_status.completed, 3);
    assert_eq!(view.average_progress_percent, 51.0);
    assert_eq!(view.average_course_hours, 32.7);
    assert_eq!(view.recent_registrations, 10);
    assert_eq!(view.employees_without_registrations, 0);
    assert_eq!(view.completion_rate_percent, 30.0);
    assert_eq!(view.engagement_percent, 100.0);

    let popular: Vec<_> = view
        .popular_courses
        .iter()
        .map(|course| (course.title.as_str(), course.count))
        .collect();
    assert_eq!(
        popular,
        vec![
            ("Git и GitHub", 2),
            ("JavaScript Advanced", 2),
            ("Python для начинающих", 2),
            ("SQL и базы данных", 2),
            ("Docker для разработчиков", 1),
        ]
    );
    assert_eq!(view.popular_courses[0].share_percent, 20.0);

    let recommendations = service.recommendations().expect("recommendations");
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].title, "Low completion rate");
}

#[test]
fn empty_service_recommends_adding_registrations() {
    let (service, _) = build_service();
    let recommendations = service.recommendations().expect("recommendations");
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].title, "No registrations");
}

#[test]
fn reports_carry_download_names() {
    let (service, _) = build_service();
    seed_demo_dataset(&service).expect("seed loads");

    let csv = service.csv_report().expect("csv report");
    assert_eq!(csv.filename, "course_report.csv");
    assert!(csv.body.contains("Registrations,10"));

    let html = service.html_report().expect("html report");
    assert!(html.filename.starts_with("course_report_"));
    assert!(html.filename.ends_with(".html"));
    assert!(html.body.contains("Python для начинающих"));
}

#[test]
fn popular_limit_follows_report_config() {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = TrainingService::new(
        store,
        ReportConfig {
            recent_window_days: 30,
            popular_limit: 2,
        },
    );
    seed_demo_dataset(&service).expect("seed loads");

    let view = service.statistics().expect("statistics").summary();
    assert_eq!(view.popular_courses.len(), 2);
}

#[test]
fn unavailable_store_is_a_server_error() {
    let service = TrainingService::new(Arc::new(UnavailableStore), ReportConfig::default());

    let err = service.create_employee(ivan()).expect_err("store offline");
    assert!(matches!(err, TrainingServiceError::Store(_)));
    assert!(!err.is_client_error());
    assert!(service.statistics().is_err());
}

/// Releases `first` on one thread and `rest` on seven others at the same moment.
fn race<F, G>(service: &Arc<TrainingService<InMemoryRecordStore>>, first: F, rest: G)
where
    F: Fn(&TrainingService<InMemoryRecordStore>) + Send + Sync + 'static,
    G: Fn(&TrainingService<InMemoryRecordStore>) + Send + Sync + 'static,
{
    let first = Arc::new(first);
    let rest = Arc::new(rest);
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|n| {
            let service = service.clone();
            let barrier = barrier.clone();
            let first = first.clone();
            let rest = rest.clone();
            thread::spawn(move || {
                barrier.wait();
                if n == 0 {
                    first(&service);
                } else {
                    rest(&service);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread completes");
    }
}

#[test]
fn progress_racing_completion_never_reopens_the_course() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");
    let id = service
        .enroll(enrollment(employee.id, course.id))
        .expect("enroll")
        .id;
    service.update_status(id, "in_progress").expect("started");
    let service = Arc::new(service);

    race(
        &service,
        move |service| {
            service.update_status(id, "completed").expect("completes");
        },
        move |service| {
            let _ = service.update_progress(id, 40);
        },
    );

    let settled = service.registration(id).expect("fetch");
    assert_eq!(settled.status, RegistrationStatus::Completed);
    assert_eq!(settled.progress_percent, 100);
    assert!(settled.completed_at.is_some());
}

#[test]
fn progress_racing_delete_never_revives_the_registration() {
    let (service, _) = build_service();
    let employee = service.create_employee(ivan()).expect("employee");
    let course = service.create_course(python_course()).expect("course");
    let id = service
        .enroll(enrollment(employee.id, course.id))
        .expect("enroll")
        .id;
    let service = Arc::new(service);

    race(
        &service,
        move |service| {
            service.delete_registration(id).expect("deletes");
        },
        move |service| {
            let _ = service.update_progress(id, 10);
        },
    );

    let settled = service.registration(id).expect("fetch");
    assert!(settled.is_deleted);
    assert!(service
        .registrations(Visibility::Active)
        .expect("list")
        .is_empty());
}

#[test]
fn deleting_unknown_records_is_not_found() {
    let (service, _) = build_service();

    assert!(matches!(
        service.delete_employee(EmployeeId(41)),
        Err(TrainingServiceError::NotFound { kind: RecordKind::Employee, id: 41 })
    ));
    assert!(matches!(
        service.delete_course(CourseId(42)),
        Err(TrainingServiceError::NotFound { kind: RecordKind::Course, id: 42 })
    ));
    assert!(matches!(
        service.delete_registration(RegistrationId(43)),
        Err(TrainingServiceError::NotFound { kind: RecordKind::Registration, id: 43 })
    ));
    assert!(matches!(
        service.update_progress(RegistrationId(43), 10),
        Err(TrainingServiceError::NotFound { .. })
    ));
}
