use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Assignment;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::assignment::{
    AssignmentCreate, AssignmentResponse, GradeSubmission, SubmissionCreate, SubmissionResponse,
};
use crate::services::grading;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:assignment_id/submissions", post(create_submission))
}

pub(crate) fn submissions_router() -> Router<AppState> {
    Router::new().route("/:submission_id/grade", post(grade_submission))
}

pub(crate) async fn create_assignment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    guards::require_course_teacher(&state, &user, &course_id).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            course_id: &course_id,
            title: &payload.title,
            description: &payload.description,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment))))
}

pub(crate) async fn list_assignments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    crate::api::modules::require_course_access(&state, &user, &course_id).await?;

    let assignments = repositories::assignments::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    Ok(Json(assignments.into_iter().map(AssignmentResponse::from_db).collect()))
}

async fn create_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
    Json(payload): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    if user.role != UserRole::Student {
        return Err(ApiError::Forbidden("Student access required"));
    }

    let assignment = fetch_assignment(&state, &assignment_id).await?;
    guards::require_enrollment(&state, &user, &assignment.course_id).await?;

    let inserted = repositories::assignments::create_submission(
        state.db(),
        repositories::assignments::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &assignment.id,
            student_id: &user.id,
            content: payload.content.as_deref(),
            file_path: payload.file_path.as_deref(),
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create submission"))?;

    if !inserted {
        return Err(ApiError::Conflict("Assignment has already been submitted".to_string()));
    }

    let submission =
        repositories::assignments::find_submission_by_student(state.db(), &assignment.id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
            .ok_or_else(|| {
                ApiError::internal("missing row after insert", "Failed to create submission")
            })?;

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission))))
}

async fn grade_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
    Json(payload): Json<GradeSubmission>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = repositories::assignments::find_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let assignment = fetch_assignment(&state, &submission.assignment_id).await?;
    guards::require_course_teacher(&state, &user, &assignment.course_id).await?;

    repositories::assignments::grade_submission(
        state.db(),
        &submission.id,
        payload.grade,
        payload.feedback.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?;

    grading::recompute_overall_grade(state.db(), &submission.student_id, &assignment.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to recompute course grade"))?;

    let graded = repositories::assignments::find_submission(state.db(), &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reload submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok(Json(SubmissionResponse::from_db(graded)))
}

async fn fetch_assignment(state: &AppState, assignment_id: &str) -> Result<Assignment, ApiError> {
    repositories::assignments::find_by_id(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))
}
