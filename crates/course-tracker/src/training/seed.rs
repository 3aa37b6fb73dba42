//! Demo dataset used by `demo`, `report` and `serve --seed-demo`.

use serde_json::json;
use tracing::info;

use super::domain::{
    CourseId, CourseSubmission, EmployeeId, EmployeeSubmission, RegistrationStatus,
    RegistrationSubmission,
};
use super::service::{TrainingService, TrainingServiceError};
use super::store::RecordStore;

const EMPLOYEES: [(&str, &str, &str); 7] = [
    ("Полина Царева", "+79991234567", "Разработчик"),
    ("Иван Иванов", "+79997654321", "Тестировщик"),
    ("Мария Петрова", "+79995556677", "Аналитик"),
    ("Алексей Сидоров", "+79998887766", "Менеджер проекта"),
    ("Елена Козлова", "+79993334455", "Дизайнер"),
    ("Дмитрий Смирнов", "+79996665544", "Системный администратор"),
    ("Ольга Васильева", "+79997776655", "Архитектор ПО"),
];

const COURSES: [(&str, u16, &str); 6] = [
    ("Python для начинающих", 40, "Сертификат"),
    ("JavaScript Advanced", 60, "Диплом"),
    ("SQL и базы данных", 24, "Удостоверение"),
    ("Git и GitHub", 8, "Сертификат"),
    ("Docker для разработчиков", 16, "Сертификат"),
    ("React.js Fundamentals", 48, "Диплом"),
];

/// `(employee index, course index, status, progress)`
const REGISTRATIONS: [(usize, usize, RegistrationStatus, i64); 10] = [
    (0, 0, RegistrationStatus::Completed, 100),
    (1, 0, RegistrationStatus::InProgress, 75),
    (2, 1, RegistrationStatus::Enrolled, 0),
    (3, 2, RegistrationStatus::Completed, 100),
    (0, 1, RegistrationStatus::InProgress, 45),
    (4, 3, RegistrationStatus::Enrolled, 0),
    (5, 4, RegistrationStatus::InProgress, 60),
    (6, 5, RegistrationStatus::Completed, 100),
    (1, 2, RegistrationStatus::InProgress, 30),
    (2, 3, RegistrationStatus::Enrolled, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub employees: usize,
    pub courses: usize,
    pub registrations: usize,
}

/// Loads the demo dataset through the regular service operations.
pub fn seed_demo_dataset<S>(
    service: &TrainingService<S>,
) -> Result<SeedSummary, TrainingServiceError>
where
    S: RecordStore + 'static,
{
    let employees: Vec<EmployeeId> = EMPLOYEES
        .iter()
        .map(|(full_name, phone, position)| {
            service
                .create_employee(EmployeeSubmission {
                    full_name: Some(full_name.to_string()),
                    phone: Some(phone.to_string()),
                    position: Some(position.to_string()),
                })
                .map(|employee| employee.id)
        })
        .collect::<Result<_, _>>()?;

    let courses: Vec<CourseId> = COURSES
        .iter()
        .map(|(title, hours, certificate_type)| {
            service
                .create_course(CourseSubmission {
                    title: Some(title.to_string()),
                    duration_hours: Some(json!(hours)),
                    certificate_type: Some(certificate_type.to_string()),
                })
                .map(|course| course.id)
        })
        .collect::<Result<_, _>>()?;

    for (employee, course, status, progress) in REGISTRATIONS {
        let registration = service.enroll(RegistrationSubmission {
            employee_id: Some(employees[employee].0),
            course_id: Some(courses[course].0),
        })?;

        match status {
            RegistrationStatus::Enrolled => {}
            RegistrationStatus::InProgress => {
                service.update_progress(registration.id, progress)?;
            }
            RegistrationStatus::Completed => {
                service.update_status(registration.id, RegistrationStatus::InProgress.label())?;
                service.update_status(registration.id, RegistrationStatus::Completed.label())?;
            }
        }
    }

    let summary = SeedSummary {
        employees: employees.len(),
        courses: courses.len(),
        registrations: REGISTRATIONS.len(),
    };
    info!(
        employees = summary.employees,
        courses = summary.courses,
        registrations = summary.registrations,
        "demo dataset loaded"
    );
    Ok(summary)
}
