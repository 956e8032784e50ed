use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::SubmissionStatus;
use crate::schemas::answer::AnswerResponse;

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) student_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) status: SubmissionStatus,
    pub(crate) completion_percentage: i32,
    pub(crate) started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submitted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) graded_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) graded_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) time_spent_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) feedback: Option<String>,
    /// Omitted when review is not permitted for the requesting principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answers: Option<Vec<AnswerResponse>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerGrade {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(alias = "pointsEarned")]
    #[validate(range(min = 0.0, message = "points_earned must be non-negative"))]
    pub(crate) points_earned: f64,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeRequest {
    #[validate(nested)]
    #[validate(length(min = 1, message = "at least one answer grade is required"))]
    pub(crate) answers: Vec<AnswerGrade>,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReturnRequest {
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}
