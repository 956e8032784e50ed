use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::QuestionType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[validate(length(min = 1, message = "option text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 1, max = 500, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default = "default_enabled_true")]
    #[serde(alias = "isRequired")]
    pub(crate) is_required: bool,
    #[serde(default = "default_points")]
    #[validate(range(min = 0.0, message = "points must be non-negative"))]
    pub(crate) points: f64,
    #[serde(default)]
    #[serde(alias = "minWordCount")]
    #[validate(range(min = 1, message = "min_word_count must be positive"))]
    pub(crate) min_word_count: Option<i32>,
    #[serde(default)]
    #[serde(alias = "maxWordCount")]
    #[validate(range(min = 1, message = "max_word_count must be positive"))]
    pub(crate) max_word_count: Option<i32>,
    #[serde(default)]
    #[serde(alias = "textMaxLength")]
    #[validate(range(min = 1, message = "text_max_length must be positive"))]
    pub(crate) text_max_length: Option<i32>,
    #[serde(default)]
    #[serde(alias = "textPlaceholder")]
    pub(crate) text_placeholder: Option<String>,
    #[serde(default)]
    #[serde(alias = "maxFileSizeMb")]
    #[validate(range(min = 1, message = "max_file_size_mb must be positive"))]
    pub(crate) max_file_size_mb: Option<i32>,
    #[serde(default)]
    #[serde(alias = "allowedFileTypes")]
    pub(crate) allowed_file_types: Option<String>,
    #[serde(default)]
    #[serde(alias = "requiredTranslation")]
    pub(crate) required_translation: Option<String>,
    #[serde(default = "default_enabled_true")]
    #[serde(alias = "allowMultipleVerses")]
    pub(crate) allow_multiple_verses: bool,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) position: i32,
    /// Hidden from students; populated only on the staff view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) is_required: bool,
    pub(crate) position: i32,
    pub(crate) points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) min_word_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_word_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text_max_length: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text_placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_file_size_mb: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) allowed_file_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) required_translation: Option<String>,
    pub(crate) allow_multiple_verses: bool,
    pub(crate) options: Vec<OptionResponse>,
}

fn default_enabled_true() -> bool {
    true
}

fn default_points() -> f64 {
    1.0
}
