use std::collections::HashSet;

use serde::Serialize;

use crate::db::models::{Answer, Question};
use crate::db::types::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct ScoreSummary {
    pub(crate) score: f64,
    pub(crate) max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ScoringError {
    #[error("submission is marked graded but required answers have no points")]
    GradingIncomplete,
}

/// Point totals for a submission. Ungraded answers contribute 0 to the
/// score but their `max_points` still count, so a partially graded
/// submission shows an honest denominator.
///
/// When the submission claims to be graded or returned, a required answer
/// without `points_earned` means grading was only partially applied and the
/// totals would be misleading; that case is rejected instead of summed.
pub(crate) fn aggregate(
    status: SubmissionStatus,
    questions: &[Question],
    answers: &[Answer],
) -> Result<ScoreSummary, ScoringError> {
    if matches!(status, SubmissionStatus::Graded | SubmissionStatus::Returned) {
        let required_ids: HashSet<&str> = questions
            .iter()
            .filter(|question| question.is_required)
            .map(|question| question.id.as_str())
            .collect();

        let ungraded_required = answers.iter().any(|answer| {
            required_ids.contains(answer.question_id.as_str()) && answer.points_earned.is_none()
        });
        if ungraded_required {
            return Err(ScoringError::GradingIncomplete);
        }
    }

    let score = answers.iter().filter_map(|answer| answer.points_earned).sum();
    let max_score = answers.iter().filter_map(|answer| answer.max_points).sum();

    Ok(ScoreSummary { score, max_score })
}
