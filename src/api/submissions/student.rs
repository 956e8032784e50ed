use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::submissions::helpers;
use crate::api::tests::helpers as test_helpers;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::Question;
use crate::db::types::AnswerPayload;
use crate::repositories;
use crate::schemas::answer::{AnswerResponse, AnswerWriteRequest, FileUploadResponse};
use crate::schemas::submission::SubmissionResponse;
use crate::services::attachments::AttachmentManager;
use crate::services::question_types;
use crate::services::submission_lifecycle;
use crate::services::{answer_validation, attachments};

pub(in crate::api::submissions) async fn my_submissions(
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let submissions = repositories::submissions::list_by_student(state.db(), &principal.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(
        submissions
            .into_iter()
            .map(|submission| helpers::to_response(submission, None))
            .collect(),
    ))
}

pub(in crate::api::submissions) async fn get_submission(
    Path(submission_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    helpers::require_owner_or_staff(&principal, &submission)?;

    let test = test_helpers::fetch_test(state.db(), &submission.test_id).await?;
    let answers = if helpers::answers_visible(principal.is_staff(), &test, &submission) {
        let answers = repositories::answers::list_by_submission(state.db(), &submission_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;
        Some(answers.into_iter().map(helpers::answer_to_response).collect())
    } else {
        None
    };

    Ok(Json(helpers::to_response(submission, answers)))
}

async fn fetch_question_for_submission(
    state: &AppState,
    submission_test_id: &str,
    question_id: &str,
) -> Result<Question, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound(format!("Question {question_id} not found")))?;

    if question.test_id != submission_test_id {
        return Err(ApiError::BadRequest(
            "Question does not belong to this test".to_string(),
        ));
    }

    Ok(question)
}

/// Stores or replaces one answer. Invalid answers are stored too, flagged
/// with their reason, so partial work is never lost; only the completion
/// numerator ignores them.
pub(in crate::api::submissions) async fn write_answer(
    Path(submission_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<AnswerWriteRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    helpers::require_owner(&principal, &submission)?;
    submission_lifecycle::ensure_editable(&submission)?;

    let question =
        fetch_question_for_submission(&state, &submission.test_id, &request.question_id).await?;
    let payload = request.into_payload().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let options = repositories::questions::options_by_question(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question options"))?;

    let result = answer_validation::validate(&question, &options, Some(&payload));
    let invalid_reason = result.reason().map(|reason| reason.as_str());

    let now = primitive_now_utc();
    let answer_id = Uuid::new_v4().to_string();
    repositories::answers::upsert(
        state.db(),
        repositories::answers::UpsertAnswer {
            id: &answer_id,
            submission_id: &submission.id,
            question_id: &question.id,
            payload: &payload,
            is_valid: result.is_valid(),
            invalid_reason,
            max_points: question.points,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store answer"))?;

    helpers::recompute_completion(state.db(), &submission, now).await?;

    Ok(Json(AnswerResponse {
        question_id: question.id,
        payload,
        is_valid: result.is_valid(),
        invalid_reason: invalid_reason.map(str::to_string),
        points_earned: None,
        max_points: Some(question.points),
        feedback: None,
        answered_at: format_primitive(now),
    }))
}

pub(in crate::api::submissions) async fn submit(
    Path(submission_id): Path<String>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    helpers::require_owner(&principal, &submission)?;

    let test = test_helpers::fetch_test(state.db(), &submission.test_id).await?;
    let questions = repositories::questions::list_by_test(state.db(), &submission.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let options = repositories::questions::options_by_test(state.db(), &submission.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question options"))?;
    let answers = repositories::answers::list_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    // The submit gate revalidates from scratch rather than trusting flags
    // written at answer time.
    let valid = helpers::revalidate_answers(&questions, options, &answers);
    submission_lifecycle::ensure_can_submit(&submission, &questions, &valid)?;

    let now = primitive_now_utc();
    let completion =
        submission_lifecycle::completion_percentage(questions.len(), valid.len());
    let time_spent = submission_lifecycle::time_spent_minutes(submission.started_at, now);

    repositories::submissions::mark_submitted(
        state.db(),
        &submission_id,
        completion,
        time_spent,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to submit"))?;
    metrics::counter!("submissions_submitted_total").increment(1);

    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    let answers = if test.allow_review_after_submission {
        Some(answers.into_iter().map(helpers::answer_to_response).collect())
    } else {
        None
    };
    Ok(Json(helpers::to_response(submission, answers)))
}

pub(in crate::api::submissions) async fn upload_file(
    Path((submission_id, question_id)): Path<(String, String)>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponse>, ApiError> {
    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    helpers::require_owner(&principal, &submission)?;
    submission_lifecycle::ensure_editable(&submission)?;

    let question =
        fetch_question_for_submission(&state, &submission.test_id, &question_id).await?;
    if !question_types::type_info(question.question_type).has_file_upload {
        return Err(ApiError::BadRequest(
            "This question does not accept file uploads".to_string(),
        ));
    }

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let max_bytes = question
        .max_file_size_mb
        .map(|mb| mb as u64)
        .unwrap_or(state.settings().storage().max_upload_size_mb)
        * 1024
        * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name().unwrap_or("") != "file" {
            continue;
        }
        filename = field.file_name().map(|s| s.to_string());
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    max_bytes / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let filename =
        filename.ok_or_else(|| ApiError::BadRequest("File must have a name".to_string()))?;

    let previous = repositories::answers::find_by_submission_and_question(
        state.db(),
        &submission_id,
        &question_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load answer"))?;

    let manager =
        AttachmentManager::new(state.redis().clone(), state.storage().cloned(), state.settings());
    let file_ref = manager
        .upload(
            &submission_id,
            &question_id,
            &question,
            previous.as_ref().map(|answer| &answer.payload.0),
            &filename,
            file_bytes,
        )
        .await?;
    metrics::counter!("attachment_uploads_total").increment(1);

    let payload = AnswerPayload::File {
        file_url: file_ref.key.clone(),
        file_name: file_ref.file_name.clone(),
        size_bytes: file_ref.size_bytes,
    };
    let options: Vec<crate::db::models::QuestionOption> = Vec::new();
    let result = answer_validation::validate(&question, &options, Some(&payload));

    let now = primitive_now_utc();
    let answer_id = Uuid::new_v4().to_string();
    repositories::answers::upsert(
        state.db(),
        repositories::answers::UpsertAnswer {
            id: &answer_id,
            submission_id: &submission_id,
            question_id: &question_id,
            payload: &payload,
            is_valid: result.is_valid(),
            invalid_reason: result.reason().map(|reason| reason.as_str()),
            max_points: question.points,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store answer"))?;

    helpers::recompute_completion(state.db(), &submission, now).await?;

    let download_url = match manager.download_url(&file_ref.key).await {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(error = %err, "failed to presign download url");
            None
        }
    };

    Ok(Json(FileUploadResponse {
        file_url: file_ref.key,
        file_name: file_ref.file_name,
        size_bytes: file_ref.size_bytes,
        download_url,
    }))
}

/// Removes the attachment. The answer row is cleared only after the remote
/// delete succeeds, never optimistically.
pub(in crate::api::submissions) async fn delete_file(
    Path((submission_id, question_id)): Path<(String, String)>,
    CurrentUser(principal): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let submission = helpers::fetch_submission(state.db(), &submission_id).await?;
    helpers::require_owner(&principal, &submission)?;
    submission_lifecycle::ensure_editable(&submission)?;

    let answer = repositories::answers::find_by_submission_and_question(
        state.db(),
        &submission_id,
        &question_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load answer"))?
    .ok_or_else(|| ApiError::NotFound("No file attached to this question".to_string()))?;

    let key = match attachments::slot_for(Some(&answer.payload.0), false) {
        attachments::AttachmentSlot::Attached(file_ref) => file_ref.key,
        _ => {
            return Err(ApiError::NotFound("No file attached to this question".to_string()))
        }
    };

    let manager =
        AttachmentManager::new(state.redis().clone(), state.storage().cloned(), state.settings());
    manager.delete(&submission_id, &question_id, &key).await?;

    repositories::answers::delete_by_submission_and_question(
        state.db(),
        &submission_id,
        &question_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to clear answer"))?;

    helpers::recompute_completion(state.db(), &submission, primitive_now_utc()).await?;

    Ok(StatusCode::NO_CONTENT)
}
