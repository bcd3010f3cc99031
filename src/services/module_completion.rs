//! Module completion. A module is eligible once every one of its tests
//! has at least one passed attempt; confirming stamps the progress row
//! exactly once and never unsets it.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::ModuleProgress;
use crate::repositories;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CompletionError {
    #[error("module has tests without a passed attempt")]
    NotEligible,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// A module with no tests is trivially complete.
pub(crate) async fn is_module_complete(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    module_id: &str,
) -> Result<bool, sqlx::Error> {
    let unpassed =
        repositories::modules::count_unpassed_tests(executor, student_id, module_id).await?;
    Ok(unpassed == 0)
}

/// Confirms completion for an eligible module. Idempotent: a repeat call
/// returns the existing progress row with its original timestamp.
pub(crate) async fn confirm_completion(
    pool: &PgPool,
    student_id: &str,
    module_id: &str,
) -> Result<ModuleProgress, CompletionError> {
    let mut tx = pool.begin().await?;

    if !is_module_complete(&mut *tx, student_id, module_id).await? {
        return Err(CompletionError::NotEligible);
    }

    repositories::modules::ensure_progress(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        student_id,
        module_id,
    )
    .await?;
    repositories::modules::mark_completed(&mut *tx, student_id, module_id, primitive_now_utc())
        .await?;

    let progress = repositories::modules::find_progress(&mut *tx, student_id, module_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    tx.commit().await?;
    Ok(progress)
}
