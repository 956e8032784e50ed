use std::collections::HashMap;

use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionOption, Test};
use crate::repositories;
use crate::schemas::question::{OptionResponse, QuestionCreate, QuestionResponse};
use crate::schemas::test::{TestResponse, TestSummaryResponse};
use crate::services::question_order;
use crate::services::question_types;

pub(crate) async fn fetch_test(pool: &PgPool, test_id: &str) -> Result<Test, ApiError> {
    repositories::tests::find_by_id(pool, test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound(format!("Test {test_id} not found")))
}

pub(crate) fn question_to_response(
    question: Question,
    options: Vec<QuestionOption>,
    include_correct: bool,
) -> QuestionResponse {
    QuestionResponse {
        id: question.id,
        question_type: question.question_type,
        title: question.title,
        description: question.description,
        is_required: question.is_required,
        position: question.position,
        points: question.points,
        min_word_count: question.min_word_count,
        max_word_count: question.max_word_count,
        text_max_length: question.text_max_length,
        text_placeholder: question.text_placeholder,
        max_file_size_mb: question.max_file_size_mb,
        allowed_file_types: question.allowed_file_types,
        required_translation: question.required_translation,
        allow_multiple_verses: question.allow_multiple_verses,
        options: options
            .into_iter()
            .map(|option| OptionResponse {
                id: option.id,
                text: option.text,
                position: option.position,
                is_correct: include_correct.then_some(option.is_correct),
            })
            .collect(),
    }
}

/// Loads a test's questions in the order the requesting principal should
/// see them. Staff always see the authored order with grading keys;
/// students get the per-student shuffle when the test asks for one.
pub(crate) async fn load_question_responses(
    pool: &PgPool,
    test: &Test,
    student_view_for: Option<&str>,
) -> Result<Vec<QuestionResponse>, ApiError> {
    let questions = repositories::questions::list_by_test(pool, &test.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let options = repositories::questions::options_by_test(pool, &test.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question options"))?;

    let mut options_by_question: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        options_by_question.entry(option.question_id.clone()).or_default().push(option);
    }

    let (questions, include_correct) = match student_view_for {
        Some(student_id) => (
            question_order::order_for_student(
                questions,
                test.randomize_questions,
                &test.id,
                student_id,
            ),
            false,
        ),
        None => (questions, true),
    };

    Ok(questions
        .into_iter()
        .map(|question| {
            let options = options_by_question.remove(&question.id).unwrap_or_default();
            question_to_response(question, options, include_correct)
        })
        .collect())
}

pub(crate) fn test_to_response(test: Test, questions: Vec<QuestionResponse>) -> TestResponse {
    TestResponse {
        id: test.id,
        title: test.title,
        description: test.description,
        instructions: test.instructions,
        time_limit_minutes: test.time_limit_minutes,
        max_attempts: test.max_attempts,
        allow_review_after_submission: test.allow_review_after_submission,
        randomize_questions: test.randomize_questions,
        status: test.status,
        available_from: test.available_from.map(format_primitive),
        available_until: test.available_until.map(format_primitive),
        created_by: test.created_by,
        published_at: test.published_at.map(format_primitive),
        created_at: format_primitive(test.created_at),
        updated_at: format_primitive(test.updated_at),
        questions,
    }
}

pub(crate) fn test_to_summary(test: Test, question_count: i64) -> TestSummaryResponse {
    TestSummaryResponse {
        id: test.id,
        title: test.title,
        status: test.status,
        max_attempts: test.max_attempts,
        available_from: test.available_from.map(format_primitive),
        available_until: test.available_until.map(format_primitive),
        question_count,
        created_at: format_primitive(test.created_at),
    }
}

/// Rejects constraint fields that make no sense for the question's type,
/// per the capability table.
pub(crate) fn validate_question_constraints(payload: &QuestionCreate) -> Result<(), ApiError> {
    let info = question_types::type_info(payload.question_type);

    if info.has_options {
        if payload.options.len() < 2 {
            return Err(ApiError::BadRequest(
                "Choice questions need at least two options".to_string(),
            ));
        }
    } else if !payload.options.is_empty() {
        return Err(ApiError::BadRequest(
            "Options are only allowed on choice questions".to_string(),
        ));
    }

    if !info.has_word_count
        && (payload.min_word_count.is_some()
            || payload.max_word_count.is_some()
            || payload.text_max_length.is_some()
            || payload.text_placeholder.is_some())
    {
        return Err(ApiError::BadRequest(
            "Text constraints are only allowed on free-text questions".to_string(),
        ));
    }

    if let (Some(min), Some(max)) = (payload.min_word_count, payload.max_word_count) {
        if min > max {
            return Err(ApiError::BadRequest(
                "min_word_count must not exceed max_word_count".to_string(),
            ));
        }
    }

    if !info.has_file_upload
        && (payload.max_file_size_mb.is_some() || payload.allowed_file_types.is_some())
    {
        return Err(ApiError::BadRequest(
            "File constraints are only allowed on document upload questions".to_string(),
        ));
    }

    if !info.has_scripture_reference && payload.required_translation.is_some() {
        return Err(ApiError::BadRequest(
            "required_translation is only allowed on scripture reference questions".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_question_constraints;
    use crate::api::errors::ApiError;
    use crate::db::types::QuestionType;
    use crate::schemas::question::QuestionCreate;

    fn question_create(question_type: QuestionType) -> QuestionCreate {
        serde_json::from_value(serde_json::json!({
            "question_type": serde_json::to_value(question_type).unwrap(),
            "title": "Question"
        }))
        .unwrap()
    }

    #[test]
    fn choice_questions_require_options() {
        let payload = question_create(QuestionType::SingleChoice);
        assert!(matches!(
            validate_question_constraints(&payload),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn essay_rejects_file_constraints() {
        let mut payload = question_create(QuestionType::Essay);
        payload.max_file_size_mb = Some(5);
        assert!(matches!(
            validate_question_constraints(&payload),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn word_count_bounds_must_be_ordered() {
        let mut payload = question_create(QuestionType::Essay);
        payload.min_word_count = Some(500);
        payload.max_word_count = Some(100);
        assert!(matches!(
            validate_question_constraints(&payload),
            Err(ApiError::BadRequest(_))
        ));

        payload.min_word_count = Some(100);
        payload.max_word_count = Some(500);
        assert!(validate_question_constraints(&payload).is_ok());
    }

    #[test]
    fn scripture_question_accepts_translation_constraint() {
        let mut payload = question_create(QuestionType::ScriptureReference);
        payload.required_translation = Some("ESV".to_string());
        assert!(validate_question_constraints(&payload).is_ok());
    }
}
