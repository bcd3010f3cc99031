use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentAdmin, CurrentUser};
use crate::api::{assignments, modules};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::course::{
    AssignmentGradeEntry, CourseCreate, CourseGradesResponse, CourseResponse, EnrollmentResponse,
    TestGradeEntry,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(list_courses))
        .route("/:course_id", get(get_course))
        .route("/:course_id/approve", post(approve_course))
        .route("/:course_id/enroll", post(enroll))
        .route("/:course_id/grades", get(course_grades))
        .route(
            "/:course_id/modules",
            post(modules::create_module).get(modules::list_modules),
        )
        .route(
            "/:course_id/assignments",
            post(assignments::create_assignment).get(assignments::list_assignments),
        )
}

async fn create_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    if user.role != UserRole::Teacher && user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Teacher access required"));
    }
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: payload.description.as_deref(),
            teacher_id: &user.id,
            is_active: true,
            // Courses go live once an admin approves them.
            is_approved: user.role == UserRole::Admin,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn list_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = match user.role {
        UserRole::Teacher => repositories::courses::list_by_teacher(state.db(), &user.id).await,
        _ => repositories::courses::list_active(state.db()).await,
    }
    .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = guards::fetch_course(&state, &course_id).await?;
    Ok(Json(CourseResponse::from_db(course)))
}

async fn approve_course(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    guards::fetch_course(&state, &course_id).await?;

    repositories::courses::set_approved(state.db(), &course_id, true, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to approve course"))?;

    let course = guards::fetch_course(&state, &course_id).await?;
    Ok(Json(CourseResponse::from_db(course)))
}

async fn enroll(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    if user.role != UserRole::Student {
        return Err(ApiError::Forbidden("Student access required"));
    }

    let course = guards::fetch_course(&state, &course_id).await?;
    if !course.is_active || !course.is_approved {
        return Err(ApiError::BadRequest("Course is not open for enrollment".to_string()));
    }

    let inserted = repositories::courses::enroll(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        &course_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to enroll"))?;

    let enrollment = repositories::courses::find_enrollment(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?
        .ok_or_else(|| ApiError::internal("missing row after insert", "Failed to enroll"))?;

    let status = if inserted { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn course_grades(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseGradesResponse>, ApiError> {
    let enrollment = guards::require_enrollment(&state, &user, &course_id).await?;

    let graded = repositories::assignments::graded_by_course(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load graded submissions"))?;
    let best = repositories::attempts::best_scores_by_course(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt scores"))?;

    Ok(Json(CourseGradesResponse {
        course_id,
        overall_grade: enrollment.overall_grade,
        assignments: graded
            .into_iter()
            .map(|(assignment_id, grade)| AssignmentGradeEntry { assignment_id, grade })
            .collect(),
        tests: best
            .into_iter()
            .map(|(test_id, best_score)| TestGradeEntry { test_id, best_score })
            .collect(),
    }))
}
