use sqlx::PgPool;

use crate::db::models::{TestAnswer, TestAttempt};

const COLUMNS: &str = "id, student_id, test_id, score, passed, started_at, completed_at";

const ANSWER_COLUMNS: &str = "\
    id, attempt_id, question_id, selected_options, answer_text, points_earned";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<TestAttempt>, sqlx::Error> {
    sqlx::query_as::<_, TestAttempt>(&format!("SELECT {COLUMNS} FROM test_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_open(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    test_id: &str,
) -> Result<Option<TestAttempt>, sqlx::Error> {
    sqlx::query_as::<_, TestAttempt>(&format!(
        "SELECT {COLUMNS} FROM test_attempts
         WHERE student_id = $1 AND test_id = $2 AND completed_at IS NULL"
    ))
    .bind(student_id)
    .bind(test_id)
    .fetch_optional(executor)
    .await
}

/// Inserts an open attempt. The partial unique index on
/// (student_id, test_id) WHERE completed_at IS NULL makes a concurrent
/// insert lose; the caller re-reads the surviving row in that case.
pub(crate) async fn create_open(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    test_id: &str,
    started_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO test_attempts (id, student_id, test_id, started_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(student_id)
    .bind(test_id)
    .bind(started_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Stamps score, passed and completed_at in one shot. Returns false when
/// the attempt was already completed by another request.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: f64,
    passed: bool,
    completed_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_attempts SET score = $1, passed = $2, completed_at = $3
         WHERE id = $4 AND completed_at IS NULL",
    )
    .bind(score)
    .bind(passed)
    .bind(completed_at)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_options: Option<String>,
    pub(crate) answer_text: Option<&'a str>,
    pub(crate) points_earned: f64,
}

pub(crate) async fn insert_answer(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO test_answers (
            id, attempt_id, question_id, selected_options, answer_text, points_earned
        ) VALUES ($1,$2,$3,$4,$5,$6)",
    )
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.selected_options)
    .bind(params.answer_text)
    .bind(params.points_earned)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_answers(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<TestAnswer>, sqlx::Error> {
    sqlx::query_as::<_, TestAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM test_answers WHERE attempt_id = $1 ORDER BY id"
    ))
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}

/// Best completed score and whether any attempt passed, for one test.
pub(crate) async fn best_result(
    pool: &PgPool,
    student_id: &str,
    test_id: &str,
) -> Result<(Option<f64>, bool), sqlx::Error> {
    let row: (Option<f64>, Option<bool>) = sqlx::query_as(
        "SELECT MAX(score), BOOL_OR(passed) FROM test_attempts
         WHERE student_id = $1 AND test_id = $2 AND completed_at IS NOT NULL",
    )
    .bind(student_id)
    .bind(test_id)
    .fetch_one(pool)
    .await?;

    Ok((row.0, row.1.unwrap_or(false)))
}

/// Best completed score per test of a course for one student.
pub(crate) async fn best_scores_by_course(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<(String, f64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, f64)>(
        "SELECT a.test_id, MAX(a.score) FROM test_attempts a
         JOIN tests t ON t.id = a.test_id
         JOIN modules m ON m.id = t.module_id
         WHERE a.student_id = $1
           AND m.course_id = $2
           AND a.completed_at IS NOT NULL
           AND a.score IS NOT NULL
         GROUP BY a.test_id",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}
