use serde::{Deserialize, Serialize};

use crate::db::types::{AnswerPayload, ScriptureReference};

#[derive(Debug, Deserialize)]
pub(crate) struct FileAnswerWrite {
    #[serde(alias = "fileUrl")]
    pub(crate) file_url: String,
    #[serde(alias = "fileName")]
    pub(crate) file_name: String,
    #[serde(alias = "sizeBytes")]
    pub(crate) size_bytes: i64,
}

/// One answer write. Exactly one payload field may be populated; the
/// populated field must match the question's type, which the handler checks
/// against the question before storing.
#[derive(Debug, Deserialize)]
pub(crate) struct AnswerWriteRequest {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "textAnswer")]
    pub(crate) text_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "booleanAnswer")]
    pub(crate) boolean_answer: Option<bool>,
    #[serde(default)]
    #[serde(alias = "selectedOptions")]
    pub(crate) selected_options: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "dateAnswer")]
    pub(crate) date_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "scriptureReferences")]
    pub(crate) scripture_references: Option<Vec<ScriptureReference>>,
    #[serde(default)]
    #[serde(alias = "fileAnswer")]
    pub(crate) file_answer: Option<FileAnswerWrite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum PayloadError {
    #[error("no answer payload field was provided")]
    Missing,
    #[error("more than one answer payload field was provided")]
    Multiple,
}

impl AnswerWriteRequest {
    /// Collapses the optional payload fields into the tagged payload,
    /// enforcing the exactly-one rule.
    pub(crate) fn into_payload(self) -> Result<AnswerPayload, PayloadError> {
        let mut payloads: Vec<AnswerPayload> = Vec::new();

        if let Some(text) = self.text_answer {
            payloads.push(AnswerPayload::Text { text });
        }
        if let Some(value) = self.boolean_answer {
            payloads.push(AnswerPayload::Boolean { value });
        }
        if let Some(selected_option_ids) = self.selected_options {
            payloads.push(AnswerPayload::Choice { selected_option_ids });
        }
        if let Some(date) = self.date_answer {
            payloads.push(AnswerPayload::Date { date });
        }
        if let Some(references) = self.scripture_references {
            payloads.push(AnswerPayload::Scripture { references });
        }
        if let Some(file) = self.file_answer {
            payloads.push(AnswerPayload::File {
                file_url: file.file_url,
                file_name: file.file_name,
                size_bytes: file.size_bytes,
            });
        }

        match payloads.len() {
            0 => Err(PayloadError::Missing),
            1 => Ok(payloads.remove(0)),
            _ => Err(PayloadError::Multiple),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) question_id: String,
    pub(crate) payload: AnswerPayload,
    pub(crate) is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) invalid_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) points_earned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) feedback: Option<String>,
    pub(crate) answered_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct FileUploadResponse {
    pub(crate) file_url: String,
    pub(crate) file_name: String,
    pub(crate) size_bytes: i64,
    /// Short-lived download link for the uploaded object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) download_url: Option<String>,
}
