use std::collections::HashSet;

use time::PrimitiveDateTime;

use crate::db::models::{Question, Submission, Test};
use crate::db::types::{DisplayStatus, SubmissionStatus, TestStatus};

/// Rejections raised by lifecycle checks. Every variant maps to a distinct
/// caller-facing message, so the client can tell "no attempts left" apart
/// from "test not open yet".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TransitionError {
    #[error("attempt limit of {max_attempts} reached for this test")]
    AttemptLimitExceeded { max_attempts: i32 },
    #[error("test is not available: {reason}")]
    TestNotAvailable { reason: &'static str },
    #[error("submission is {status} and can no longer be modified")]
    SubmissionLocked { status: &'static str },
    #[error("{count} required question(s) still lack a valid answer")]
    IncompleteRequiredAnswers { count: usize },
}

fn status_name(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::InProgress => "in_progress",
        SubmissionStatus::Submitted => "submitted",
        SubmissionStatus::Graded => "graded",
        SubmissionStatus::Returned => "returned",
    }
}

fn locked(status: SubmissionStatus) -> TransitionError {
    TransitionError::SubmissionLocked { status: status_name(status) }
}

/// Gate for opening a new attempt. Returns the attempt number the new
/// submission should carry. All time comparisons use the caller-supplied
/// timestamp so the check is deterministic.
pub(crate) fn ensure_can_start(
    test: &Test,
    existing_attempts: i64,
    now: PrimitiveDateTime,
) -> Result<i32, TransitionError> {
    match test.status {
        TestStatus::Published => {}
        TestStatus::Draft => {
            return Err(TransitionError::TestNotAvailable { reason: "test is not published" })
        }
        TestStatus::Archived => {
            return Err(TransitionError::TestNotAvailable { reason: "test has been archived" })
        }
    }

    if let Some(from) = test.available_from {
        if now < from {
            return Err(TransitionError::TestNotAvailable { reason: "test is not open yet" });
        }
    }
    if let Some(until) = test.available_until {
        if now > until {
            return Err(TransitionError::TestNotAvailable { reason: "test has closed" });
        }
    }

    if existing_attempts >= i64::from(test.max_attempts) {
        return Err(TransitionError::AttemptLimitExceeded { max_attempts: test.max_attempts });
    }

    Ok(existing_attempts as i32 + 1)
}

/// Answers may only be written while the submission is in progress.
pub(crate) fn ensure_editable(submission: &Submission) -> Result<(), TransitionError> {
    match submission.status {
        SubmissionStatus::InProgress => Ok(()),
        status => Err(locked(status)),
    }
}

/// Submit gate: the submission must be in progress and every required
/// question must hold a valid answer.
pub(crate) fn ensure_can_submit(
    submission: &Submission,
    questions: &[Question],
    valid_question_ids: &HashSet<String>,
) -> Result<(), TransitionError> {
    ensure_editable(submission)?;

    let unmet = questions
        .iter()
        .filter(|question| question.is_required && !valid_question_ids.contains(&question.id))
        .count();
    if unmet > 0 {
        return Err(TransitionError::IncompleteRequiredAnswers { count: unmet });
    }

    Ok(())
}

/// Grading is allowed from `submitted` and, for re-grading, from `returned`.
pub(crate) fn ensure_gradable(submission: &Submission) -> Result<(), TransitionError> {
    match submission.status {
        SubmissionStatus::Submitted | SubmissionStatus::Returned => Ok(()),
        status => Err(locked(status)),
    }
}

/// A submission is handed back to the student only after it was graded.
pub(crate) fn ensure_returnable(submission: &Submission) -> Result<(), TransitionError> {
    match submission.status {
        SubmissionStatus::Graded => Ok(()),
        status => Err(locked(status)),
    }
}

/// Share of the test's questions that currently hold a valid answer.
/// The denominator counts every question, required or optional; rounded to
/// the nearest integer and clamped to [0, 100]. A test with no questions
/// reports 0.
pub(crate) fn completion_percentage(total_questions: usize, valid_answers: usize) -> i32 {
    if total_questions == 0 {
        return 0;
    }
    let percent = (valid_answers as f64 / total_questions as f64) * 100.0;
    (percent.round() as i32).clamp(0, 100)
}

pub(crate) fn time_spent_minutes(
    started_at: PrimitiveDateTime,
    submitted_at: PrimitiveDateTime,
) -> i32 {
    let minutes = (submitted_at - started_at).whole_minutes();
    minutes.clamp(0, i64::from(i32::MAX)) as i32
}

/// Read-only classification shown to the student. `overdue` is reported
/// when the window has closed and no attempt was ever started; `returned`
/// collapses into `graded` since the student sees the same thing either way.
pub(crate) fn display_status(
    test: &Test,
    submission: Option<&Submission>,
    now: PrimitiveDateTime,
) -> DisplayStatus {
    match submission {
        Some(submission) => match submission.status {
            SubmissionStatus::InProgress => DisplayStatus::InProgress,
            SubmissionStatus::Submitted => DisplayStatus::Submitted,
            SubmissionStatus::Graded | SubmissionStatus::Returned => DisplayStatus::Graded,
        },
        None => match test.available_until {
            Some(until) if now > until => DisplayStatus::Overdue,
            _ => DisplayStatus::NotStarted,
        },
    }
}
