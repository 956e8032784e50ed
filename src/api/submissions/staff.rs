use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStaff;
use crate::api::submissions::helpers;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Question;
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::schemas::submission::{GradeRequest, ReturnRequest, SubmissionResponse};
use crate::services::{scoring, submission_lifecycle};

pub(in crate::api::submissions) async fn grade_submission(
    Path(submission_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    Json(request): Json<GradeRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    request.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    submission_lifecycle::ensure_gradable(&submission)?;

    let questions = repositories::questions::list_by_test(state.db(), &submission.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let questions_by_id: HashMap<&str, &Question> =
        questions.iter().map(|question| (question.id.as_str(), question)).collect();

    for grade in &request.answers {
        let Some(question) = questions_by_id.get(grade.question_id.as_str()) else {
            return Err(ApiError::BadRequest(format!(
                "Question {} does not belong to this test",
                grade.question_id
            )));
        };
        if grade.points_earned > question.points {
            return Err(ApiError::BadRequest(format!(
                "Points for question {} exceed its maximum of {}",
                grade.question_id, question.points
            )));
        }
    }

    let now = primitive_now_utc();
    for grade in &request.answers {
        let updated = repositories::answers::set_points(
            state.db(),
            &submission_id,
            &grade.question_id,
            grade.points_earned,
            grade.feedback.as_deref(),
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record grade"))?;
        if !updated {
            return Err(ApiError::BadRequest(format!(
                "No answer was submitted for question {}",
                grade.question_id
            )));
        }
    }

    // Totals are computed from what is actually stored; if a required answer
    // is still ungraded the grade is rejected and the submission stays
    // submitted with the partial points saved.
    let answers = repositories::answers::list_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;
    let summary = scoring::aggregate(SubmissionStatus::Graded, &questions, &answers)?;

    repositories::submissions::mark_graded(
        state.db(),
        &submission_id,
        &staff.id,
        summary.score,
        summary.max_score,
        request.feedback.as_deref(),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?;
    metrics::counter!("submissions_graded_total").increment(1);

    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    let answers = answers.into_iter().map(helpers::answer_to_response).collect();
    Ok(Json(helpers::to_response(submission, Some(answers))))
}

pub(in crate::api::submissions) async fn return_submission(
    Path(submission_id): Path<String>,
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
    Json(request): Json<ReturnRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    submission_lifecycle::ensure_returnable(&submission)?;

    repositories::submissions::mark_returned(
        state.db(),
        &submission_id,
        request.feedback.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to return submission"))?;

    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    let answers = repositories::answers::list_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?
        .into_iter()
        .map(helpers::answer_to_response)
        .collect();
    Ok(Json(helpers::to_response(submission, Some(answers))))
}
