use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Answer;
use crate::db::types::AnswerPayload;

pub(crate) const COLUMNS: &str = "\
    id, submission_id, question_id, payload, is_valid, invalid_reason, \
    points_earned, max_points, feedback, answered_at, updated_at";

pub(crate) struct UpsertAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) submission_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) payload: &'a AnswerPayload,
    pub(crate) is_valid: bool,
    pub(crate) invalid_reason: Option<&'a str>,
    pub(crate) max_points: f64,
    pub(crate) now: PrimitiveDateTime,
}

/// One row per (submission, question); re-answering replaces the payload
/// and resets the validity flags. `max_points` is snapshotted from the
/// question so totals stay stable if staff later retune point values.
pub(crate) async fn upsert(pool: &PgPool, params: UpsertAnswer<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO answers (id, submission_id, question_id, payload, is_valid, \
         invalid_reason, max_points, answered_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         ON CONFLICT (submission_id, question_id) DO UPDATE
         SET payload = EXCLUDED.payload,
             is_valid = EXCLUDED.is_valid,
             invalid_reason = EXCLUDED.invalid_reason,
             max_points = EXCLUDED.max_points,
             answered_at = EXCLUDED.answered_at,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(params.id)
    .bind(params.submission_id)
    .bind(params.question_id)
    .bind(Json(params.payload))
    .bind(params.is_valid)
    .bind(params.invalid_reason)
    .bind(params.max_points)
    .bind(params.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_submission(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers WHERE submission_id = $1 ORDER BY answered_at"
    ))
    .bind(submission_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_submission_and_question(
    pool: &PgPool,
    submission_id: &str,
    question_id: &str,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers WHERE submission_id = $1 AND question_id = $2"
    ))
    .bind(submission_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_submission_and_question(
    pool: &PgPool,
    submission_id: &str,
    question_id: &str,
) -> Result<bool, sqlx::Error> {
    let deleted =
        sqlx::query("DELETE FROM answers WHERE submission_id = $1 AND question_id = $2")
            .bind(submission_id)
            .bind(question_id)
            .execute(pool)
            .await?;
    Ok(deleted.rows_affected() > 0)
}

/// Grading writes points and feedback only; the payload is never touched.
pub(crate) async fn set_points(
    pool: &PgPool,
    submission_id: &str,
    question_id: &str,
    points_earned: f64,
    feedback: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE answers
         SET points_earned = $1, feedback = $2, updated_at = $3
         WHERE submission_id = $4 AND question_id = $5",
    )
    .bind(points_earned)
    .bind(feedback)
    .bind(now)
    .bind(submission_id)
    .bind(question_id)
    .execute(pool)
    .await?;
    Ok(updated.rows_affected() > 0)
}
