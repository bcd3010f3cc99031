//! Course grade recomputation. The overall grade is rebuilt from scratch
//! after every grading action and every completed attempt.

use sqlx::PgPool;

use crate::repositories;

/// Weighted average over graded work: every graded submission and every
/// test (best completed score) is worth 100 points. Returns `None` when
/// the student has no graded work yet, which is stored as NULL rather
/// than a misleading zero.
pub(crate) fn compute_overall_grade(
    submission_grades: &[f64],
    best_test_scores: &[f64],
) -> Option<f64> {
    let count = submission_grades.len() + best_test_scores.len();
    if count == 0 {
        return None;
    }

    let earned: f64 = submission_grades.iter().sum::<f64>() + best_test_scores.iter().sum::<f64>();
    let possible = count as f64 * 100.0;
    Some(earned / possible * 100.0)
}

/// Recomputes and writes the enrollment's overall grade. Writes NULL when
/// nothing is graded, so a previously graded value never lingers.
pub(crate) async fn recompute_overall_grade(
    pool: &PgPool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<f64>, sqlx::Error> {
    let graded = repositories::assignments::graded_by_course(pool, student_id, course_id).await?;
    let submission_grades: Vec<f64> = graded.into_iter().map(|(_, grade)| grade).collect();
    let best = repositories::attempts::best_scores_by_course(pool, student_id, course_id).await?;
    let best_scores: Vec<f64> = best.into_iter().map(|(_, score)| score).collect();

    let overall = compute_overall_grade(&submission_grades, &best_scores);
    repositories::courses::update_overall_grade(pool, student_id, course_id, overall).await?;

    Ok(overall)
}
