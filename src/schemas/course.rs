use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Course, Enrollment};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) teacher_id: String,
    pub(crate) is_active: bool,
    pub(crate) is_approved: bool,
    pub(crate) created_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            teacher_id: course.teacher_id,
            is_active: course.is_active,
            is_approved: course.is_approved,
            created_at: format_primitive(course.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) enrolled_at: String,
    pub(crate) overall_grade: Option<f64>,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            enrolled_at: format_primitive(enrollment.enrolled_at),
            overall_grade: enrollment.overall_grade,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentGradeEntry {
    pub(crate) assignment_id: String,
    pub(crate) grade: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestGradeEntry {
    pub(crate) test_id: String,
    pub(crate) best_score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseGradesResponse {
    pub(crate) course_id: String,
    pub(crate) overall_grade: Option<f64>,
    pub(crate) assignments: Vec<AssignmentGradeEntry>,
    pub(crate) tests: Vec<TestGradeEntry>,
}
