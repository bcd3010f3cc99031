use crate::api::errors::ApiError;
use crate::db::types::QuestionType;
use crate::schemas::test::QuestionCreate;

/// Shape rules the `validator` derive cannot express: options belong to
/// choice questions, true/false carries a boolean answer instead.
pub(crate) fn validate_question_shape(payload: &QuestionCreate) -> Result<(), ApiError> {
    match payload.question_type {
        QuestionType::MultipleChoice => {
            if payload.options.len() < 2 {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need at least two options".to_string(),
                ));
            }
            if !payload.options.iter().any(|option| option.is_correct) {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need at least one correct option".to_string(),
                ));
            }
        }
        QuestionType::TrueFalse => {
            if payload.correct_answer.is_none() {
                return Err(ApiError::BadRequest(
                    "true_false questions need correct_answer".to_string(),
                ));
            }
            if !payload.options.is_empty() {
                return Err(ApiError::BadRequest(
                    "true_false options are generated automatically".to_string(),
                ));
            }
        }
        QuestionType::Essay => {
            if !payload.options.is_empty() || payload.correct_answer.is_some() {
                return Err(ApiError::BadRequest(
                    "essay questions take no options".to_string(),
                ));
            }
        }
    }

    Ok(())
}
