use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

pub(crate) const COLUMNS: &str = "\
    id, test_id, student_id, attempt_number, status, started_at, submitted_at, \
    graded_at, graded_by, score, max_score, completion_percentage, \
    time_spent_minutes, feedback, created_at, updated_at";

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO submissions (id, test_id, student_id, attempt_number, status, \
         started_at, completion_percentage, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,0,$7,$8)",
    )
    .bind(params.id)
    .bind(params.test_id)
    .bind(params.student_id)
    .bind(params.attempt_number)
    .bind(SubmissionStatus::InProgress)
    .bind(params.now)
    .bind(params.now)
    .bind(params.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn count_attempts(
    pool: &PgPool,
    test_id: &str,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE test_id = $1 AND student_id = $2")
        .bind(test_id)
        .bind(student_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_in_progress(
    pool: &PgPool,
    test_id: &str,
    student_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions
         WHERE test_id = $1 AND student_id = $2 AND status = $3
         ORDER BY attempt_number DESC
         LIMIT 1"
    ))
    .bind(test_id)
    .bind(student_id)
    .bind(SubmissionStatus::InProgress)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn latest_for_student(
    pool: &PgPool,
    test_id: &str,
    student_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions
         WHERE test_id = $1 AND student_id = $2
         ORDER BY attempt_number DESC
         LIMIT 1"
    ))
    .bind(test_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE student_id = $1 ORDER BY started_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_test(
    pool: &PgPool,
    test_id: &str,
    status: Option<SubmissionStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM submissions WHERE test_id = "
    ));
    builder.push_bind(test_id);

    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    builder.push(" ORDER BY started_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Submission>().fetch_all(pool).await
}

pub(crate) async fn count_by_test(
    pool: &PgPool,
    test_id: &str,
    status: Option<SubmissionStatus>,
) -> Result<i64, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM submissions WHERE test_id = ");
    builder.push_bind(test_id);

    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn update_completion(
    pool: &PgPool,
    id: &str,
    completion_percentage: i32,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions SET completion_percentage = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(completion_percentage)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_submitted(
    pool: &PgPool,
    id: &str,
    completion_percentage: i32,
    time_spent_minutes: i32,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions
         SET status = $1,
             submitted_at = $2,
             completion_percentage = $3,
             time_spent_minutes = $4,
             updated_at = $2
         WHERE id = $5",
    )
    .bind(SubmissionStatus::Submitted)
    .bind(now)
    .bind(completion_percentage)
    .bind(time_spent_minutes)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_graded(
    pool: &PgPool,
    id: &str,
    graded_by: &str,
    score: f64,
    max_score: f64,
    feedback: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions
         SET status = $1,
             graded_at = $2,
             graded_by = $3,
             score = $4,
             max_score = $5,
             feedback = COALESCE($6, feedback),
             updated_at = $2
         WHERE id = $7",
    )
    .bind(SubmissionStatus::Graded)
    .bind(now)
    .bind(graded_by)
    .bind(score)
    .bind(max_score)
    .bind(feedback)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_returned(
    pool: &PgPool,
    id: &str,
    feedback: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions
         SET status = $1,
             feedback = COALESCE($2, feedback),
             updated_at = $3
         WHERE id = $4",
    )
    .bind(SubmissionStatus::Returned)
    .bind(feedback)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
