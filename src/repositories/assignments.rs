use sqlx::PgPool;

use crate::db::models::{Assignment, Submission};

const COLUMNS: &str = "id, course_id, title, description, created_at";

const SUBMISSION_COLUMNS: &str = "\
    id, assignment_id, student_id, content, file_path, grade, feedback, submitted_at, graded_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE course_id = $1 ORDER BY created_at"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (id, course_id, title, description, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_submission(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_submission_by_student(
    pool: &PgPool,
    assignment_id: &str,
    student_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions
         WHERE assignment_id = $1 AND student_id = $2"
    ))
    .bind(assignment_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) content: Option<&'a str>,
    pub(crate) file_path: Option<&'a str>,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

pub(crate) async fn create_submission(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO submissions (id, assignment_id, student_id, content, file_path, submitted_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT DO NOTHING",
    )
    .bind(params.id)
    .bind(params.assignment_id)
    .bind(params.student_id)
    .bind(params.content)
    .bind(params.file_path)
    .bind(params.submitted_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn grade_submission(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    grade: f64,
    feedback: Option<&str>,
    graded_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions SET grade = $1, feedback = $2, graded_at = $3 WHERE id = $4",
    )
    .bind(grade)
    .bind(feedback)
    .bind(graded_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Graded submissions of one student across a course, as
/// (assignment_id, grade) pairs.
pub(crate) async fn graded_by_course(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<(String, f64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, f64)>(
        "SELECT s.assignment_id, s.grade FROM submissions s
         JOIN assignments a ON a.id = s.assignment_id
         WHERE s.student_id = $1 AND a.course_id = $2 AND s.grade IS NOT NULL
         ORDER BY s.submitted_at",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}
