use sqlx::PgPool;

use crate::db::models::{Module, ModuleProgress};

const COLUMNS: &str = "id, course_id, title, description, position, created_at";

const PROGRESS_COLUMNS: &str = "id, student_id, module_id, completed, completed_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!("SELECT {COLUMNS} FROM modules WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {COLUMNS} FROM modules WHERE course_id = $1 ORDER BY position, created_at"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateModule<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) position: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateModule<'_>) -> Result<Module, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "INSERT INTO modules (id, course_id, title, description, position, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.position)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_progress(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    module_id: &str,
) -> Result<Option<ModuleProgress>, sqlx::Error> {
    sqlx::query_as::<_, ModuleProgress>(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM module_progress WHERE student_id = $1 AND module_id = $2"
    ))
    .bind(student_id)
    .bind(module_id)
    .fetch_optional(executor)
    .await
}

/// Lazily creates the progress row; a concurrent insert loses silently.
pub(crate) async fn ensure_progress(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    module_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO module_progress (id, student_id, module_id, completed)
         VALUES ($1,$2,$3,FALSE)
         ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(student_id)
    .bind(module_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Stamps completion exactly once; a second call leaves completed_at alone.
pub(crate) async fn mark_completed(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    module_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE module_progress SET completed = TRUE, completed_at = $1
         WHERE student_id = $2 AND module_id = $3 AND completed = FALSE",
    )
    .bind(now)
    .bind(student_id)
    .bind(module_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Tests in the module the student has not passed with any attempt.
pub(crate) async fn count_unpassed_tests(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    module_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM tests t
         WHERE t.module_id = $1
           AND NOT EXISTS (
               SELECT 1 FROM test_attempts a
               WHERE a.test_id = t.id AND a.student_id = $2 AND a.passed = TRUE
           )",
    )
    .bind(module_id)
    .bind(student_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn count_tests(
    pool: &PgPool,
    module_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM tests WHERE module_id = $1")
        .bind(module_id)
        .fetch_one(pool)
        .await
}
