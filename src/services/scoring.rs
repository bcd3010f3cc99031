//! Pure attempt scoring. No database access; callers load the question
//! facts, score, then persist inside their own transaction.

use std::collections::{HashMap, HashSet};

use crate::db::types::QuestionType;
use crate::schemas::test::AnswerPayload;

#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum ScoringError {
    #[error("question {0} does not belong to this test")]
    UnknownQuestion(String),
    #[error("answer for question {question_id} does not match its type")]
    ShapeMismatch { question_id: String },
}

/// Everything scoring needs to know about one question.
#[derive(Debug, Clone)]
pub(crate) struct QuestionFacts {
    pub(crate) id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: f64,
    pub(crate) correct_option_ids: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoredAnswer {
    pub(crate) question_id: String,
    pub(crate) selected_options: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) points_earned: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttemptScore {
    pub(crate) earned: f64,
    pub(crate) possible: f64,
    /// Percentage in [0, 100]; zero when the test carries no points.
    pub(crate) score: f64,
    pub(crate) answers: Vec<ScoredAnswer>,
}

impl AttemptScore {
    /// The verdict is `>=`: a score exactly at the threshold passes.
    pub(crate) fn passes(&self, passing_score: f64) -> bool {
        self.score >= passing_score
    }
}

/// Scores one submission against the test's questions.
///
/// Multiple choice is all-or-nothing: the selected option set must equal
/// the correct option set exactly. True/false awards points only when the
/// chosen option is a correct option of that same question. Essays always
/// earn zero here and wait for manual review. Questions the submission
/// leaves out are scored as the empty answer of their type, so every
/// question yields exactly one `ScoredAnswer`.
pub(crate) fn score_attempt(
    questions: &[QuestionFacts],
    submitted: &HashMap<String, AnswerPayload>,
) -> Result<AttemptScore, ScoringError> {
    let known: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    if let Some(stray) = submitted.keys().find(|id| !known.contains(id.as_str())) {
        return Err(ScoringError::UnknownQuestion(stray.clone()));
    }

    let mut earned = 0.0;
    let mut possible = 0.0;
    let mut answers = Vec::new();

    for question in questions {
        possible += question.points;

        let blank;
        let payload = match submitted.get(&question.id) {
            Some(payload) => payload,
            None => {
                blank = empty_answer(question.question_type);
                &blank
            }
        };

        let answer = score_one(question, payload)?;
        earned += answer.points_earned;
        answers.push(answer);
    }

    let score = if possible > 0.0 {
        earned / possible * 100.0
    } else {
        0.0
    };

    Ok(AttemptScore {
        earned,
        possible,
        score,
        answers,
    })
}

fn score_one(
    question: &QuestionFacts,
    payload: &AnswerPayload,
) -> Result<ScoredAnswer, ScoringError> {
    match (question.question_type, payload) {
        (QuestionType::MultipleChoice, AnswerPayload::MultipleChoice { selected }) => {
            let chosen: HashSet<&str> = selected.iter().map(String::as_str).collect();
            let correct: HashSet<&str> =
                question.correct_option_ids.iter().map(String::as_str).collect();
            let points_earned = if chosen == correct {
                question.points
            } else {
                0.0
            };
            Ok(ScoredAnswer {
                question_id: question.id.clone(),
                selected_options: Some(selected.join(",")),
                answer_text: None,
                points_earned,
            })
        }
        (QuestionType::TrueFalse, AnswerPayload::TrueFalse { selected }) => {
            let points_earned = match selected {
                Some(option_id) if question.correct_option_ids.contains(option_id) => {
                    question.points
                }
                _ => 0.0,
            };
            Ok(ScoredAnswer {
                question_id: question.id.clone(),
                selected_options: selected.clone(),
                answer_text: None,
                points_earned,
            })
        }
        (QuestionType::Essay, AnswerPayload::Essay { text }) => Ok(ScoredAnswer {
            question_id: question.id.clone(),
            selected_options: None,
            answer_text: Some(text.clone()),
            points_earned: 0.0,
        }),
        _ => Err(ScoringError::ShapeMismatch {
            question_id: question.id.clone(),
        }),
    }
}

fn empty_answer(question_type: QuestionType) -> AnswerPayload {
    match question_type {
        QuestionType::MultipleChoice => AnswerPayload::MultipleChoice { selected: Vec::new() },
        QuestionType::TrueFalse => AnswerPayload::TrueFalse { selected: None },
        QuestionType::Essay => AnswerPayload::Essay { text: String::new() },
    }
}
