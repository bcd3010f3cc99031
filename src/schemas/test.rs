use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionOption, Test, TestAnswer, TestAttempt};
use crate::db::types::QuestionType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default = "default_passing_score")]
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0.0, max = 100.0, message = "passing_score must be within 0..100"))]
    pub(crate) passing_score: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[serde(alias = "optionText")]
    #[validate(length(min = 1, message = "option_text must not be empty"))]
    pub(crate) option_text: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[serde(default = "default_points")]
    #[validate(range(min = 0.0, message = "points must be non-negative"))]
    pub(crate) points: f64,
    #[serde(default)]
    #[validate(range(min = 0, message = "position must be non-negative"))]
    pub(crate) position: i32,
    /// Options for multiple_choice questions.
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
    /// The answer for true_false questions; True/False options are
    /// generated automatically.
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<bool>,
}

/// Option as a student sees it, without the answer key.
#[derive(Debug, Serialize)]
pub(crate) struct OptionView {
    pub(crate) id: String,
    pub(crate) option_text: String,
}

impl OptionView {
    pub(crate) fn from_db(option: QuestionOption) -> Self {
        Self {
            id: option.id,
            option_text: option.option_text,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionView {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: f64,
    pub(crate) position: i32,
    pub(crate) options: Vec<OptionView>,
}

impl QuestionView {
    pub(crate) fn from_db(question: Question, options: Vec<OptionView>) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            question_type: question.question_type,
            points: question.points,
            position: question.position,
            options,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) passing_score: f64,
    pub(crate) created_at: String,
    pub(crate) questions: Vec<QuestionView>,
}

impl TestResponse {
    pub(crate) fn from_db(test: Test, questions: Vec<QuestionView>) -> Self {
        Self {
            id: test.id,
            module_id: test.module_id,
            title: test.title,
            description: test.description,
            passing_score: test.passing_score,
            created_at: format_primitive(test.created_at),
            questions,
        }
    }
}

/// One answer, shaped by the question type it targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum AnswerPayload {
    MultipleChoice {
        selected: Vec<String>,
    },
    TrueFalse {
        #[serde(default)]
        selected: Option<String>,
    },
    Essay {
        text: String,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAttemptRequest {
    pub(crate) answers: HashMap<String, AnswerPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) test_id: String,
    pub(crate) score: Option<f64>,
    pub(crate) passed: Option<bool>,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: TestAttempt) -> Self {
        Self {
            id: attempt.id,
            student_id: attempt.student_id,
            test_id: attempt.test_id,
            score: attempt.score,
            passed: attempt.passed,
            started_at: format_primitive(attempt.started_at),
            completed_at: attempt.completed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitAttemptResponse {
    #[serde(flatten)]
    pub(crate) attempt: AttemptResponse,
    pub(crate) module_complete: bool,
    pub(crate) overall_grade: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerView {
    pub(crate) question_id: String,
    pub(crate) selected_options: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) points_earned: f64,
}

impl AnswerView {
    pub(crate) fn from_db(answer: TestAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            selected_options: answer.selected_options,
            answer_text: answer.answer_text,
            points_earned: answer.points_earned,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptDetailResponse {
    #[serde(flatten)]
    pub(crate) attempt: AttemptResponse,
    pub(crate) answers: Vec<AnswerView>,
}

fn default_passing_score() -> f64 {
    70.0
}

fn default_points() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_payload_parses_by_tag() {
        let raw = r#"{"type": "multiple_choice", "selected": ["a", "b"]}"#;
        let payload: AnswerPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(
            payload,
            AnswerPayload::MultipleChoice {
                selected: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[test]
    fn true_false_selection_is_optional() {
        let payload: AnswerPayload = serde_json::from_str(r#"{"type": "true_false"}"#).unwrap();
        assert_eq!(payload, AnswerPayload::TrueFalse { selected: None });
    }

    #[test]
    fn mismatched_fields_fail_to_parse() {
        let raw = r#"{"type": "essay", "selected": ["a"]}"#;
        assert!(serde_json::from_str::<AnswerPayload>(raw).is_err());
    }
}
