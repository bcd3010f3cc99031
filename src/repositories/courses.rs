use sqlx::PgPool;

use crate::db::models::{Course, Enrollment};

const COLUMNS: &str = "\
    id, title, description, teacher_id, is_active, is_approved, created_at, updated_at";

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, enrolled_at, overall_grade";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses
         WHERE is_active = TRUE AND is_approved = TRUE
         ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_teacher(
    pool: &PgPool,
    teacher_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE teacher_id = $1 ORDER BY created_at DESC"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) teacher_id: &'a str,
    pub(crate) is_active: bool,
    pub(crate) is_approved: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, title, description, teacher_id, is_active, is_approved, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.teacher_id)
    .bind(params.is_active)
    .bind(params.is_approved)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_approved(
    pool: &PgPool,
    id: &str,
    approved: bool,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET is_approved = $1, updated_at = $2 WHERE id = $3")
        .bind(approved)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn find_enrollment(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn enroll(
    pool: &PgPool,
    id: &str,
    student_id: &str,
    course_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO enrollments (id, student_id, course_id, enrolled_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(student_id)
    .bind(course_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn update_overall_grade(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
    overall_grade: Option<f64>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE enrollments SET overall_grade = $1 WHERE student_id = $2 AND course_id = $3")
        .bind(overall_grade)
        .bind(student_id)
        .bind(course_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Course id owning a test, via its module.
pub(crate) async fn course_id_for_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT m.course_id FROM tests t JOIN modules m ON m.id = t.module_id WHERE t.id = $1",
    )
    .bind(test_id)
    .fetch_optional(pool)
    .await
}
