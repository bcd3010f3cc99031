//! Attempt lifecycle: starting is idempotent per (student, test), and
//! submission scores, persists and closes the attempt in one transaction.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Test, TestAttempt};
use crate::repositories;
use crate::schemas::test::AnswerPayload;
use crate::services::scoring::{self, QuestionFacts, ScoringError};
use crate::services::{grading, module_completion};

#[derive(Debug, thiserror::Error)]
pub(crate) enum AttemptError {
    #[error("attempt has already been submitted")]
    AlreadyCompleted,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Returns the student's open attempt for the test, creating one if none
/// exists. A concurrent start loses the insert and picks up the row the
/// winner created, so both callers see the same attempt.
pub(crate) async fn start_attempt(
    pool: &PgPool,
    student_id: &str,
    test_id: &str,
) -> Result<(TestAttempt, bool), sqlx::Error> {
    let mut tx = pool.begin().await?;

    if let Some(open) = repositories::attempts::find_open(&mut *tx, student_id, test_id).await? {
        tx.commit().await?;
        return Ok((open, false));
    }

    let id = Uuid::new_v4().to_string();
    let inserted =
        repositories::attempts::create_open(&mut *tx, &id, student_id, test_id, primitive_now_utc())
            .await?;

    // Re-read instead of trusting the insert: if another request beat us
    // on the partial unique index, the surviving open attempt is theirs.
    let attempt = repositories::attempts::find_open(&mut *tx, student_id, test_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    tx.commit().await?;
    Ok((attempt, inserted))
}

pub(crate) struct SubmitOutcome {
    pub(crate) attempt: TestAttempt,
    pub(crate) module_complete: bool,
    pub(crate) overall_grade: Option<f64>,
}

/// Scores the submission, records the answers and closes the attempt
/// atomically, then refreshes the course grade and reports whether the
/// module is now eligible for completion.
pub(crate) async fn submit_attempt(
    pool: &PgPool,
    attempt: &TestAttempt,
    test: &Test,
    submitted: &HashMap<String, AnswerPayload>,
) -> Result<SubmitOutcome, AttemptError> {
    if attempt.completed_at.is_some() {
        return Err(AttemptError::AlreadyCompleted);
    }

    let mut tx = pool.begin().await?;

    let questions = repositories::tests::list_questions(&mut *tx, &test.id).await?;
    let options = repositories::tests::list_options_by_test(&mut *tx, &test.id).await?;

    let mut correct_by_question: HashMap<&str, HashSet<String>> = HashMap::new();
    for option in &options {
        if option.is_correct {
            correct_by_question
                .entry(option.question_id.as_str())
                .or_default()
                .insert(option.id.clone());
        }
    }

    let facts: Vec<QuestionFacts> = questions
        .iter()
        .map(|q| QuestionFacts {
            id: q.id.clone(),
            question_type: q.question_type,
            points: q.points,
            correct_option_ids: correct_by_question.remove(q.id.as_str()).unwrap_or_default(),
        })
        .collect();

    let result = scoring::score_attempt(&facts, submitted)?;
    let passed = result.passes(test.passing_score);
    let now = primitive_now_utc();

    for answer in &result.answers {
        repositories::attempts::insert_answer(
            &mut *tx,
            repositories::attempts::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                attempt_id: &attempt.id,
                question_id: &answer.question_id,
                selected_options: answer.selected_options.clone(),
                answer_text: answer.answer_text.as_deref(),
                points_earned: answer.points_earned,
            },
        )
        .await
        // A racing submit that already wrote answer rows trips the
        // UNIQUE(attempt_id, question_id) constraint.
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AttemptError::AlreadyCompleted
            }
            other => AttemptError::Db(other),
        })?;
    }

    let closed =
        repositories::attempts::complete(&mut *tx, &attempt.id, result.score, passed, now).await?;
    if !closed {
        return Err(AttemptError::AlreadyCompleted);
    }

    tx.commit().await?;

    let attempt = repositories::attempts::find_by_id(pool, &attempt.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let module_complete =
        module_completion::is_module_complete(pool, &attempt.student_id, &test.module_id).await?;

    let overall_grade = match repositories::courses::course_id_for_test(pool, &test.id).await? {
        Some(course_id) => {
            grading::recompute_overall_grade(pool, &attempt.student_id, &course_id).await?
        }
        None => None,
    };

    Ok(SubmitOutcome {
        attempt,
        module_complete,
        overall_grade,
    })
}
