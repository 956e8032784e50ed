use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionOption};
use crate::db::types::QuestionType;

pub(crate) const COLUMNS: &str = "\
    id, test_id, question_type, title, description, is_required, position, points, \
    min_word_count, max_word_count, text_max_length, text_placeholder, \
    max_file_size_mb, allowed_file_types, required_translation, allow_multiple_verses, \
    created_at, updated_at";

const OPTION_COLUMNS: &str = "id, question_id, text, position, is_correct";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) is_required: bool,
    pub(crate) position: i32,
    pub(crate) points: f64,
    pub(crate) min_word_count: Option<i32>,
    pub(crate) max_word_count: Option<i32>,
    pub(crate) text_max_length: Option<i32>,
    pub(crate) text_placeholder: Option<&'a str>,
    pub(crate) max_file_size_mb: Option<i32>,
    pub(crate) allowed_file_types: Option<&'a str>,
    pub(crate) required_translation: Option<&'a str>,
    pub(crate) allow_multiple_verses: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) struct CreateOption<'a> {
    pub(crate) id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) position: i32,
    pub(crate) is_correct: bool,
}

/// Inserts the question and its options in one transaction so a failed
/// option insert never leaves a half-written choice question behind.
pub(crate) async fn create_with_options(
    pool: &PgPool,
    question: CreateQuestion<'_>,
    options: &[CreateOption<'_>],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO questions (id, test_id, question_type, title, description, is_required, \
         position, points, min_word_count, max_word_count, text_max_length, text_placeholder, \
         max_file_size_mb, allowed_file_types, required_translation, allow_multiple_verses, \
         created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)",
    )
    .bind(question.id)
    .bind(question.test_id)
    .bind(question.question_type)
    .bind(question.title)
    .bind(question.description)
    .bind(question.is_required)
    .bind(question.position)
    .bind(question.points)
    .bind(question.min_word_count)
    .bind(question.max_word_count)
    .bind(question.text_max_length)
    .bind(question.text_placeholder)
    .bind(question.max_file_size_mb)
    .bind(question.allowed_file_types)
    .bind(question.required_translation)
    .bind(question.allow_multiple_verses)
    .bind(question.now)
    .bind(question.now)
    .execute(&mut *tx)
    .await?;

    for option in options {
        sqlx::query(
            "INSERT INTO question_options (id, question_id, text, position, is_correct)
             VALUES ($1,$2,$3,$4,$5)",
        )
        .bind(option.id)
        .bind(question.id)
        .bind(option.text)
        .bind(option.position)
        .bind(option.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE test_id = $1 ORDER BY position"
    ))
    .bind(test_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn options_by_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT o.{} FROM question_options o
         JOIN questions q ON q.id = o.question_id
         WHERE q.test_id = $1
         ORDER BY o.question_id, o.position",
        OPTION_COLUMNS.replace(", ", ", o."),
    ))
    .bind(test_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn options_by_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE question_id = $1 ORDER BY position"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_test(pool: &PgPool, test_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn max_position(pool: &PgPool, test_id: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(position), -1) FROM questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(pool)
        .await
}
