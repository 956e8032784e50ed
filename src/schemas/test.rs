use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use validator::Validate;

use crate::db::types::{DisplayStatus, TestStatus};
use crate::schemas::question::QuestionResponse;
use crate::schemas::submission::SubmissionResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) instructions: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 1, message = "time_limit_minutes must be positive"))]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default = "default_max_attempts")]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default = "default_enabled_true")]
    #[serde(alias = "allowReviewAfterSubmission")]
    pub(crate) allow_review_after_submission: bool,
    #[serde(default)]
    #[serde(alias = "randomizeQuestions")]
    pub(crate) randomize_questions: bool,
    #[serde(
        default,
        alias = "availableFrom",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) available_from: Option<OffsetDateTime>,
    #[serde(
        default,
        alias = "availableUntil",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) available_until: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) instructions: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 1, message = "time_limit_minutes must be positive"))]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: Option<i32>,
    #[serde(default, alias = "allowReviewAfterSubmission")]
    pub(crate) allow_review_after_submission: Option<bool>,
    #[serde(default, alias = "randomizeQuestions")]
    pub(crate) randomize_questions: Option<bool>,
    #[serde(
        default,
        alias = "availableFrom",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) available_from: Option<OffsetDateTime>,
    #[serde(
        default,
        alias = "availableUntil",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) available_until: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) instructions: Option<String>,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) max_attempts: i32,
    pub(crate) allow_review_after_submission: bool,
    pub(crate) randomize_questions: bool,
    pub(crate) status: TestStatus,
    pub(crate) available_from: Option<String>,
    pub(crate) available_until: Option<String>,
    pub(crate) created_by: String,
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) status: TestStatus,
    pub(crate) max_attempts: i32,
    pub(crate) available_from: Option<String>,
    pub(crate) available_until: Option<String>,
    pub(crate) question_count: i64,
    pub(crate) created_at: String,
}

/// Student-facing progress view for one test.
#[derive(Debug, Serialize)]
pub(crate) struct TestStatusResponse {
    pub(crate) test_id: String,
    pub(crate) status: DisplayStatus,
    pub(crate) attempts_used: i64,
    pub(crate) attempts_allowed: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submission: Option<SubmissionResponse>,
}

fn default_max_attempts() -> i32 {
    1
}

fn default_enabled_true() -> bool {
    true
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // Frontend's datetime-local often sends without timezone.
    if raw.len() == 16 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}:00Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if raw.len() == 19 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    None
}

fn deserialize_option_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_offset_datetime_flexible(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_accepts_camel_case_aliases() {
        let body = serde_json::json!({
            "title": "Systematic Theology Midterm",
            "maxAttempts": 2,
            "randomizeQuestions": true,
            "availableFrom": "2026-03-02T09:00",
            "availableUntil": "2026-03-09T09:00:00Z"
        });

        let parsed: TestCreate = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.max_attempts, 2);
        assert!(parsed.randomize_questions);
        assert!(parsed.available_from.is_some());
        assert!(parsed.available_until.is_some());
    }

    #[test]
    fn create_rejects_malformed_datetimes() {
        let body = serde_json::json!({
            "title": "Midterm",
            "availableFrom": "next tuesday"
        });

        let result: Result<TestCreate, _> = serde_json::from_value(body);
        assert!(result.is_err());
    }

    #[test]
    fn create_defaults_apply() {
        let parsed: TestCreate =
            serde_json::from_value(serde_json::json!({ "title": "Quiz" })).unwrap();
        assert_eq!(parsed.max_attempts, 1);
        assert!(parsed.allow_review_after_submission);
        assert!(!parsed.randomize_questions);
    }
}
