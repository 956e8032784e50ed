use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::db::models::{Question, QuestionOption};
use crate::db::types::{AnswerPayload, QuestionType, ScriptureReference};
use crate::services::question_types;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum InvalidReason {
    MissingRequired,
    WordCountOutOfRange,
    TextTooLong,
    InvalidOptionCardinality,
    OptionNotFound,
    FileTooLarge,
    FileTypeNotAllowed,
    MalformedScriptureReference,
    MalformedDate,
}

impl InvalidReason {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing_required",
            Self::WordCountOutOfRange => "word_count_out_of_range",
            Self::TextTooLong => "text_too_long",
            Self::InvalidOptionCardinality => "invalid_option_cardinality",
            Self::OptionNotFound => "option_not_found",
            Self::FileTooLarge => "file_too_large",
            Self::FileTypeNotAllowed => "file_type_not_allowed",
            Self::MalformedScriptureReference => "malformed_scripture_reference",
            Self::MalformedDate => "malformed_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationResult {
    Valid,
    Invalid(InvalidReason),
}

impl ValidationResult {
    pub(crate) fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub(crate) fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }
}

/// Structural validation of one answer against its question. Pure and
/// idempotent: runs on every answer write and again as the submit gate.
///
/// A payload whose variant does not fit the question's type is treated as
/// absent, except for date payloads with an unparseable date string, which
/// are reported as malformed so the caller can distinguish data corruption
/// from a simple wrong-slot write.
pub(crate) fn validate(
    question: &Question,
    options: &[QuestionOption],
    answer: Option<&AnswerPayload>,
) -> ValidationResult {
    if let Some(AnswerPayload::Date { date }) = answer {
        if !date_parses(date) {
            return ValidationResult::Invalid(InvalidReason::MalformedDate);
        }
    }

    if question_types::is_free_text(question.question_type) {
        return validate_free_text(question, text_of(answer));
    }

    match question.question_type {
        QuestionType::YesNo => validate_boolean(question, answer),
        QuestionType::SingleChoice => validate_single_choice(question, options, answer),
        QuestionType::MultipleChoice => validate_multiple_choice(question, options, answer),
        QuestionType::ScriptureReference => validate_scripture(question, answer),
        QuestionType::DocumentUpload => validate_file(question, answer),
        // Free-text variants are handled above; the match stays exhaustive
        // so a new variant fails to compile until it gets a rule.
        QuestionType::Text
        | QuestionType::Essay
        | QuestionType::Reflection
        | QuestionType::MinistryPlan
        | QuestionType::TheologicalPosition
        | QuestionType::CaseStudy
        | QuestionType::SermonOutline => validate_free_text(question, text_of(answer)),
    }
}

fn missing(question: &Question) -> ValidationResult {
    if question.is_required {
        ValidationResult::Invalid(InvalidReason::MissingRequired)
    } else {
        ValidationResult::Valid
    }
}

fn text_of(answer: Option<&AnswerPayload>) -> Option<&str> {
    match answer {
        Some(AnswerPayload::Text { text }) => Some(text.as_str()),
        _ => None,
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn validate_free_text(question: &Question, text: Option<&str>) -> ValidationResult {
    let text = match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return missing(question),
    };

    if let Some(max_length) = question.text_max_length {
        if text.chars().count() > max_length as usize {
            return ValidationResult::Invalid(InvalidReason::TextTooLong);
        }
    }

    let words = word_count(text);
    if let Some(min) = question.min_word_count {
        if words < min as usize {
            return ValidationResult::Invalid(InvalidReason::WordCountOutOfRange);
        }
    }
    if let Some(max) = question.max_word_count {
        if words > max as usize {
            return ValidationResult::Invalid(InvalidReason::WordCountOutOfRange);
        }
    }

    ValidationResult::Valid
}

fn validate_boolean(question: &Question, answer: Option<&AnswerPayload>) -> ValidationResult {
    match answer {
        Some(AnswerPayload::Boolean { .. }) => ValidationResult::Valid,
        _ => missing(question),
    }
}

fn selected_ids(answer: Option<&AnswerPayload>) -> Option<&[String]> {
    match answer {
        Some(AnswerPayload::Choice { selected_option_ids }) => {
            Some(selected_option_ids.as_slice())
        }
        _ => None,
    }
}

fn options_exist(selected: &[String], options: &[QuestionOption]) -> bool {
    selected
        .iter()
        .all(|id| options.iter().any(|option| option.id == *id))
}

fn validate_single_choice(
    question: &Question,
    options: &[QuestionOption],
    answer: Option<&AnswerPayload>,
) -> ValidationResult {
    let selected = match selected_ids(answer) {
        Some(selected) => selected,
        None => return missing(question),
    };

    match selected.len() {
        0 => return missing(question),
        1 => {}
        _ => return ValidationResult::Invalid(InvalidReason::InvalidOptionCardinality),
    }

    if !options_exist(selected, options) {
        return ValidationResult::Invalid(InvalidReason::OptionNotFound);
    }

    ValidationResult::Valid
}

fn validate_multiple_choice(
    question: &Question,
    options: &[QuestionOption],
    answer: Option<&AnswerPayload>,
) -> ValidationResult {
    let selected = match selected_ids(answer) {
        Some(selected) => selected,
        None => return missing(question),
    };

    if selected.is_empty() {
        return missing(question);
    }

    if !options_exist(selected, options) {
        return ValidationResult::Invalid(InvalidReason::OptionNotFound);
    }

    ValidationResult::Valid
}

fn reference_is_well_formed(reference: &ScriptureReference) -> bool {
    if reference.book.trim().is_empty() {
        return false;
    }
    if reference.chapter < 1 || reference.verse_start < 1 {
        return false;
    }
    match reference.verse_end {
        Some(end) => end >= reference.verse_start,
        None => true,
    }
}

fn validate_scripture(question: &Question, answer: Option<&AnswerPayload>) -> ValidationResult {
    let references = match answer {
        Some(AnswerPayload::Scripture { references }) if !references.is_empty() => references,
        _ => return missing(question),
    };

    if !question.allow_multiple_verses && references.len() > 1 {
        return ValidationResult::Invalid(InvalidReason::MalformedScriptureReference);
    }

    for reference in references {
        if !reference_is_well_formed(reference) {
            return ValidationResult::Invalid(InvalidReason::MalformedScriptureReference);
        }
        if let Some(required) = question.required_translation.as_deref() {
            if reference.translation.as_deref() != Some(required) {
                return ValidationResult::Invalid(InvalidReason::MalformedScriptureReference);
            }
        }
    }

    ValidationResult::Valid
}

pub(crate) fn extension_allowed(file_name: &str, allowed: &str) -> bool {
    let extension = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            extension.to_ascii_lowercase()
        }
        _ => return false,
    };

    allowed
        .split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|entry| entry == extension)
}

fn validate_file(question: &Question, answer: Option<&AnswerPayload>) -> ValidationResult {
    let (file_url, file_name, size_bytes) = match answer {
        Some(AnswerPayload::File { file_url, file_name, size_bytes }) => {
            (file_url, file_name, *size_bytes)
        }
        _ => return missing(question),
    };

    if file_url.trim().is_empty() {
        return missing(question);
    }

    // Re-check stored file answers against the question's limits so a
    // constraint tightened after upload still surfaces at submit time.
    if let Some(max_mb) = question.max_file_size_mb {
        if size_bytes > i64::from(max_mb) * 1024 * 1024 {
            return ValidationResult::Invalid(InvalidReason::FileTooLarge);
        }
    }
    if let Some(allowed) = question.allowed_file_types.as_deref() {
        if !extension_allowed(file_name, allowed) {
            return ValidationResult::Invalid(InvalidReason::FileTypeNotAllowed);
        }
    }

    ValidationResult::Valid
}

fn date_parses(raw: &str) -> bool {
    if OffsetDateTime::parse(raw, &Rfc3339).is_ok() {
        return true;
    }
    let calendar = time::format_description::parse("[year]-[month]-[day]");
    match calendar {
        Ok(format) => Date::parse(raw, &format).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{option_fixture, question_fixture};

    fn text(value: &str) -> AnswerPayload {
        AnswerPayload::Text { text: value.to_string() }
    }

    fn choice(ids: &[&str]) -> AnswerPayload {
        AnswerPayload::Choice {
            selected_option_ids: ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[test]
    fn required_question_without_answer_is_missing() {
        let question = question_fixture(QuestionType::Essay, true);
        let result = validate(&question, &[], None);
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::MissingRequired));
    }

    #[test]
    fn optional_question_without_answer_is_valid() {
        let question = question_fixture(QuestionType::Essay, false);
        assert!(validate(&question, &[], None).is_valid());
    }

    #[test]
    fn min_word_count_boundary() {
        let mut question = question_fixture(QuestionType::Essay, true);
        question.min_word_count = Some(3);

        let below = validate(&question, &[], Some(&text("two words")));
        assert_eq!(below, ValidationResult::Invalid(InvalidReason::WordCountOutOfRange));

        let exact = validate(&question, &[], Some(&text("exactly three words")));
        assert!(exact.is_valid());
    }

    #[test]
    fn max_word_count_rejects_overflow() {
        let mut question = question_fixture(QuestionType::Reflection, true);
        question.max_word_count = Some(2);

        let result = validate(&question, &[], Some(&text("one two three")));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::WordCountOutOfRange));
    }

    #[test]
    fn text_max_length_counts_characters() {
        let mut question = question_fixture(QuestionType::Text, true);
        question.text_max_length = Some(5);

        let result = validate(&question, &[], Some(&text("abcdef")));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::TextTooLong));
        assert!(validate(&question, &[], Some(&text("abcde"))).is_valid());
    }

    #[test]
    fn whitespace_only_text_counts_as_missing() {
        let question = question_fixture(QuestionType::Text, true);
        let result = validate(&question, &[], Some(&text("   \n\t ")));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::MissingRequired));
    }

    #[test]
    fn single_choice_rejects_two_selections() {
        let question = question_fixture(QuestionType::SingleChoice, true);
        let options = vec![
            option_fixture(&question.id, "opt-1"),
            option_fixture(&question.id, "opt-2"),
        ];

        let result = validate(&question, &options, Some(&choice(&["opt-1", "opt-2"])));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::InvalidOptionCardinality));

        assert!(validate(&question, &options, Some(&choice(&["opt-2"]))).is_valid());
    }

    #[test]
    fn unknown_option_id_is_rejected() {
        let question = question_fixture(QuestionType::MultipleChoice, true);
        let options = vec![option_fixture(&question.id, "opt-1")];

        let result = validate(&question, &options, Some(&choice(&["opt-1", "opt-9"])));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::OptionNotFound));
    }

    #[test]
    fn required_multiple_choice_needs_a_selection() {
        let question = question_fixture(QuestionType::MultipleChoice, true);
        let result = validate(&question, &[], Some(&choice(&[])));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::MissingRequired));
    }

    #[test]
    fn scripture_translation_must_match_when_required() {
        let mut question = question_fixture(QuestionType::ScriptureReference, true);
        question.required_translation = Some("ESV".to_string());

        let reference = |translation: &str| AnswerPayload::Scripture {
            references: vec![ScriptureReference {
                book: "Romans".to_string(),
                chapter: 8,
                verse_start: 28,
                verse_end: None,
                translation: Some(translation.to_string()),
            }],
        };

        let wrong = validate(&question, &[], Some(&reference("NIV")));
        assert_eq!(
            wrong,
            ValidationResult::Invalid(InvalidReason::MalformedScriptureReference)
        );
        assert!(validate(&question, &[], Some(&reference("ESV"))).is_valid());
    }

    #[test]
    fn single_verse_questions_reject_multiple_references() {
        let mut question = question_fixture(QuestionType::ScriptureReference, true);
        question.allow_multiple_verses = false;

        let reference = ScriptureReference {
            book: "John".to_string(),
            chapter: 3,
            verse_start: 16,
            verse_end: None,
            translation: None,
        };
        let payload = AnswerPayload::Scripture {
            references: vec![reference.clone(), reference],
        };

        let result = validate(&question, &[], Some(&payload));
        assert_eq!(
            result,
            ValidationResult::Invalid(InvalidReason::MalformedScriptureReference)
        );
    }

    #[test]
    fn inverted_verse_range_is_malformed() {
        let question = question_fixture(QuestionType::ScriptureReference, true);
        let payload = AnswerPayload::Scripture {
            references: vec![ScriptureReference {
                book: "Psalms".to_string(),
                chapter: 23,
                verse_start: 4,
                verse_end: Some(2),
                translation: None,
            }],
        };

        let result = validate(&question, &[], Some(&payload));
        assert_eq!(
            result,
            ValidationResult::Invalid(InvalidReason::MalformedScriptureReference)
        );
    }

    #[test]
    fn stored_file_answer_rechecks_size_and_type() {
        let mut question = question_fixture(QuestionType::DocumentUpload, true);
        question.max_file_size_mb = Some(5);
        question.allowed_file_types = Some("pdf, docx".to_string());

        let oversized = AnswerPayload::File {
            file_url: "submissions/a/b/essay.pdf".to_string(),
            file_name: "essay.pdf".to_string(),
            size_bytes: 6 * 1024 * 1024,
        };
        assert_eq!(
            validate(&question, &[], Some(&oversized)),
            ValidationResult::Invalid(InvalidReason::FileTooLarge)
        );

        let wrong_type = AnswerPayload::File {
            file_url: "submissions/a/b/essay.exe".to_string(),
            file_name: "essay.exe".to_string(),
            size_bytes: 1024,
        };
        assert_eq!(
            validate(&question, &[], Some(&wrong_type)),
            ValidationResult::Invalid(InvalidReason::FileTypeNotAllowed)
        );

        let fine = AnswerPayload::File {
            file_url: "submissions/a/b/essay.PDF".to_string(),
            file_name: "essay.PDF".to_string(),
            size_bytes: 5 * 1024 * 1024,
        };
        assert!(validate(&question, &[], Some(&fine)).is_valid());
    }

    #[test]
    fn malformed_date_payload_is_flagged() {
        let question = question_fixture(QuestionType::Text, true);
        let payload = AnswerPayload::Date { date: "not-a-date".to_string() };

        let result = validate(&question, &[], Some(&payload));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::MalformedDate));
    }

    #[test]
    fn well_formed_date_payload_never_matches_a_question_type() {
        let question = question_fixture(QuestionType::Text, true);
        let payload = AnswerPayload::Date { date: "2026-03-01".to_string() };

        let result = validate(&question, &[], Some(&payload));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::MissingRequired));
    }

    #[test]
    fn mismatched_payload_counts_as_missing() {
        let question = question_fixture(QuestionType::YesNo, false);
        let result = validate(&question, &[], Some(&text("yes")));
        assert!(result.is_valid());

        let required = question_fixture(QuestionType::YesNo, true);
        let result = validate(&required, &[], Some(&text("yes")));
        assert_eq!(result, ValidationResult::Invalid(InvalidReason::MissingRequired));
    }

    #[test]
    fn validation_is_idempotent() {
        let mut question = question_fixture(QuestionType::Essay, true);
        question.min_word_count = Some(2);
        let payload = text("only");

        let first = validate(&question, &[], Some(&payload));
        let second = validate(&question, &[], Some(&payload));
        assert_eq!(first, second);
    }
}
