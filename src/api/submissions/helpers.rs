use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::api::guards::Principal;
use crate::core::time::format_primitive;
use crate::db::models::{Answer, Question, QuestionOption, Submission, Test};
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::schemas::answer::AnswerResponse;
use crate::schemas::submission::SubmissionResponse;
use crate::services::answer_validation;
use crate::services::submission_lifecycle;

pub(crate) async fn fetch_submission(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Submission, ApiError> {
    repositories::submissions::find_by_id(pool, submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {submission_id} not found")))
}

pub(crate) fn require_owner(
    principal: &Principal,
    submission: &Submission,
) -> Result<(), ApiError> {
    if submission.student_id == principal.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied"))
    }
}

pub(crate) fn require_owner_or_staff(
    principal: &Principal,
    submission: &Submission,
) -> Result<(), ApiError> {
    if principal.is_staff() {
        return Ok(());
    }
    require_owner(principal, submission)
}

pub(crate) fn answer_to_response(answer: Answer) -> AnswerResponse {
    AnswerResponse {
        question_id: answer.question_id,
        payload: answer.payload.0,
        is_valid: answer.is_valid,
        invalid_reason: answer.invalid_reason,
        points_earned: answer.points_earned,
        max_points: answer.max_points,
        feedback: answer.feedback,
        answered_at: format_primitive(answer.answered_at),
    }
}

pub(crate) fn to_response(
    submission: Submission,
    answers: Option<Vec<AnswerResponse>>,
) -> SubmissionResponse {
    SubmissionResponse {
        id: submission.id,
        test_id: submission.test_id,
        student_id: submission.student_id,
        attempt_number: submission.attempt_number,
        status: submission.status,
        completion_percentage: submission.completion_percentage,
        started_at: format_primitive(submission.started_at),
        submitted_at: submission.submitted_at.map(format_primitive),
        graded_at: submission.graded_at.map(format_primitive),
        graded_by: submission.graded_by,
        score: submission.score,
        max_score: submission.max_score,
        time_spent_minutes: submission.time_spent_minutes,
        feedback: submission.feedback,
        answers,
    }
}

/// Students see their answers while the attempt is open; after submission
/// only when the test permits review. Staff always see them.
pub(crate) fn answers_visible(is_staff: bool, test: &Test, submission: &Submission) -> bool {
    is_staff
        || submission.status == SubmissionStatus::InProgress
        || test.allow_review_after_submission
}

fn options_by_question(options: Vec<QuestionOption>) -> HashMap<String, Vec<QuestionOption>> {
    let mut grouped: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        grouped.entry(option.question_id.clone()).or_default().push(option);
    }
    grouped
}

/// Re-runs validation on every stored answer against the current question
/// constraints and returns the ids of questions holding a valid answer.
/// Questions with no stored answer are never in the set, even optional ones.
pub(crate) fn revalidate_answers(
    questions: &[Question],
    options: Vec<QuestionOption>,
    answers: &[Answer],
) -> HashSet<String> {
    let grouped = options_by_question(options);
    let answers_by_question: HashMap<&str, &Answer> =
        answers.iter().map(|answer| (answer.question_id.as_str(), answer)).collect();

    questions
        .iter()
        .filter(|question| {
            let Some(answer) = answers_by_question.get(question.id.as_str()) else {
                return false;
            };
            let question_options =
                grouped.get(&question.id).map(Vec::as_slice).unwrap_or(&[]);
            answer_validation::validate(question, question_options, Some(&answer.payload.0))
                .is_valid()
        })
        .map(|question| question.id.clone())
        .collect()
}

/// Recomputes and persists the completion percentage after any answer
/// mutation.
pub(crate) async fn recompute_completion(
    pool: &PgPool,
    submission: &Submission,
    now: time::PrimitiveDateTime,
) -> Result<i32, ApiError> {
    let questions = repositories::questions::list_by_test(pool, &submission.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let answers = repositories::answers::list_by_submission(pool, &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    let valid_count = answers.iter().filter(|answer| answer.is_valid).count();
    let percentage =
        submission_lifecycle::completion_percentage(questions.len(), valid_count);

    repositories::submissions::update_completion(pool, &submission.id, percentage, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update completion"))?;

    Ok(percentage)
}
