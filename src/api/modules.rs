use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Module, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::module::{
    ModuleCompletionResponse, ModuleCreate, ModuleDetailResponse, ModuleProgressResponse,
    ModuleResponse, TestSummaryResponse,
};
use crate::schemas::test::{TestCreate, TestResponse};
use crate::services::module_completion::{self, CompletionError};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:module_id", get(get_module))
        .route("/:module_id/complete", post(complete_module))
        .route("/:module_id/tests", post(create_test))
}

pub(crate) async fn create_module(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    guards::require_course_teacher(&state, &user, &course_id).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let module = repositories::modules::create(
        state.db(),
        repositories::modules::CreateModule {
            id: &Uuid::new_v4().to_string(),
            course_id: &course_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            position: payload.position,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create module"))?;

    Ok((StatusCode::CREATED, Json(ModuleResponse::from_db(module))))
}

pub(crate) async fn list_modules(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<ModuleProgressResponse>>, ApiError> {
    require_course_access(&state, &user, &course_id).await?;

    let modules = repositories::modules::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list modules"))?;

    let mut items = Vec::with_capacity(modules.len());
    for module in modules {
        items.push(progress_view(&state, &user, module).await?);
    }

    Ok(Json(items))
}

async fn get_module(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> Result<Json<ModuleDetailResponse>, ApiError> {
    let module = fetch_module(&state, &module_id).await?;
    require_course_access(&state, &user, &module.course_id).await?;

    let tests = repositories::tests::list_by_module(state.db(), &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tests"))?;

    let mut summaries = Vec::with_capacity(tests.len());
    for test in tests {
        let (best_score, passed) =
            repositories::attempts::best_result(state.db(), &user.id, &test.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load attempt results"))?;
        summaries.push(TestSummaryResponse {
            id: test.id,
            title: test.title,
            passing_score: test.passing_score,
            best_score,
            passed,
        });
    }

    let eligible = module_completion::is_module_complete(state.db(), &user.id, &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to evaluate module completion"))?;
    let progress = repositories::modules::find_progress(state.db(), &user.id, &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load module progress"))?;

    Ok(Json(ModuleDetailResponse {
        module: ModuleResponse::from_db(module),
        completed: progress.map(|p| p.completed).unwrap_or(false),
        eligible_for_completion: eligible,
        tests: summaries,
    }))
}

async fn complete_module(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> Result<Json<ModuleCompletionResponse>, ApiError> {
    if user.role != UserRole::Student {
        return Err(ApiError::Forbidden("Student access required"));
    }

    let module = fetch_module(&state, &module_id).await?;
    guards::require_enrollment(&state, &user, &module.course_id).await?;

    let progress = module_completion::confirm_completion(state.db(), &user.id, &module.id)
        .await
        .map_err(|err| match err {
            CompletionError::NotEligible => {
                ApiError::BadRequest("Module has tests without a passed attempt".to_string())
            }
            CompletionError::Db(e) => ApiError::internal(e, "Failed to complete module"),
        })?;

    Ok(Json(ModuleCompletionResponse::from_db(progress)))
}

async fn create_test(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(module_id): Path<String>,
    Json(payload): Json<TestCreate>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    let module = fetch_module(&state, &module_id).await?;
    guards::require_course_teacher(&state, &user, &module.course_id).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test = repositories::tests::create(
        state.db(),
        repositories::tests::CreateTest {
            id: &Uuid::new_v4().to_string(),
            module_id: &module.id,
            title: &payload.title,
            description: payload.description.as_deref(),
            passing_score: payload.passing_score,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test"))?;

    Ok((StatusCode::CREATED, Json(TestResponse::from_db(test, Vec::new()))))
}

pub(crate) async fn fetch_module(state: &AppState, module_id: &str) -> Result<Module, ApiError> {
    repositories::modules::find_by_id(state.db(), module_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch module"))?
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))
}

/// Students need an enrollment; the course teacher and admins pass through.
pub(crate) async fn require_course_access(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<(), ApiError> {
    if user.role == UserRole::Student {
        guards::require_enrollment(state, user, course_id).await?;
        return Ok(());
    }

    guards::require_course_teacher(state, user, course_id).await?;
    Ok(())
}

async fn progress_view(
    state: &AppState,
    user: &User,
    module: Module,
) -> Result<ModuleProgressResponse, ApiError> {
    let tests_total = repositories::modules::count_tests(state.db(), &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count tests"))?;
    let unpassed = repositories::modules::count_unpassed_tests(state.db(), &user.id, &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unpassed tests"))?;
    let progress = repositories::modules::find_progress(state.db(), &user.id, &module.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load module progress"))?;

    Ok(ModuleProgressResponse {
        module: ModuleResponse::from_db(module),
        completed: progress.map(|p| p.completed).unwrap_or(false),
        tests_total,
        tests_passed: tests_total - unpassed,
    })
}
