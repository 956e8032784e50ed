use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "teststatus", rename_all = "snake_case")]
pub(crate) enum TestStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    Text,
    Essay,
    YesNo,
    SingleChoice,
    MultipleChoice,
    ScriptureReference,
    DocumentUpload,
    Reflection,
    MinistryPlan,
    TheologicalPosition,
    CaseStudy,
    SermonOutline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submissionstatus", rename_all = "snake_case")]
pub(crate) enum SubmissionStatus {
    InProgress,
    Submitted,
    Graded,
    Returned,
}

/// Caller-facing progress classification for a (student, test) pair.
/// `Overdue` is derived at read time and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DisplayStatus {
    NotStarted,
    InProgress,
    Submitted,
    Graded,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScriptureReference {
    pub(crate) book: String,
    pub(crate) chapter: i32,
    pub(crate) verse_start: i32,
    #[serde(default)]
    pub(crate) verse_end: Option<i32>,
    #[serde(default)]
    pub(crate) translation: Option<String>,
}

/// One populated payload per answer, discriminated by the owning question's
/// type. Stored as JSONB; the tag makes stored rows self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum AnswerPayload {
    Text { text: String },
    Boolean { value: bool },
    Choice { selected_option_ids: Vec<String> },
    Date { date: String },
    Scripture { references: Vec<ScriptureReference> },
    File { file_url: String, file_name: String, size_bytes: i64 },
}
