use crate::db::types::QuestionType;

/// Capability table for a question type. Every branch in the answer
/// validator and every rendering hint in the API derives from this table,
/// so adding a variant means one arm here plus one arm in the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuestionTypeInfo {
    pub(crate) has_options: bool,
    pub(crate) has_word_count: bool,
    pub(crate) has_file_upload: bool,
    pub(crate) has_scripture_reference: bool,
    pub(crate) label: &'static str,
    pub(crate) description: &'static str,
}

const FREE_TEXT: QuestionTypeInfo = QuestionTypeInfo {
    has_options: false,
    has_word_count: true,
    has_file_upload: false,
    has_scripture_reference: false,
    label: "",
    description: "",
};

const CHOICE: QuestionTypeInfo = QuestionTypeInfo {
    has_options: true,
    has_word_count: false,
    has_file_upload: false,
    has_scripture_reference: false,
    label: "",
    description: "",
};

pub(crate) fn type_info(question_type: QuestionType) -> QuestionTypeInfo {
    match question_type {
        QuestionType::Text => QuestionTypeInfo {
            label: "Short answer",
            description: "A single short free-text response",
            ..FREE_TEXT
        },
        QuestionType::Essay => QuestionTypeInfo {
            label: "Essay",
            description: "A long-form written response",
            ..FREE_TEXT
        },
        QuestionType::Reflection => QuestionTypeInfo {
            label: "Reflection",
            description: "A personal reflection on the assigned material",
            ..FREE_TEXT
        },
        QuestionType::MinistryPlan => QuestionTypeInfo {
            label: "Ministry plan",
            description: "A structured plan for a ministry initiative",
            ..FREE_TEXT
        },
        QuestionType::TheologicalPosition => QuestionTypeInfo {
            label: "Theological position",
            description: "A defended doctrinal position statement",
            ..FREE_TEXT
        },
        QuestionType::CaseStudy => QuestionTypeInfo {
            label: "Case study",
            description: "An analysis of a pastoral case study",
            ..FREE_TEXT
        },
        QuestionType::SermonOutline => QuestionTypeInfo {
            label: "Sermon outline",
            description: "An outline of a sermon on the given passage",
            ..FREE_TEXT
        },
        QuestionType::YesNo => QuestionTypeInfo {
            has_options: false,
            has_word_count: false,
            has_file_upload: false,
            has_scripture_reference: false,
            label: "Yes / No",
            description: "A single boolean response",
        },
        QuestionType::SingleChoice => QuestionTypeInfo {
            label: "Single choice",
            description: "Exactly one option from a fixed list",
            ..CHOICE
        },
        QuestionType::MultipleChoice => QuestionTypeInfo {
            label: "Multiple choice",
            description: "Any number of options from a fixed list",
            ..CHOICE
        },
        QuestionType::ScriptureReference => QuestionTypeInfo {
            has_options: false,
            has_word_count: false,
            has_file_upload: false,
            has_scripture_reference: true,
            label: "Scripture reference",
            description: "One or more book/chapter/verse citations",
        },
        QuestionType::DocumentUpload => QuestionTypeInfo {
            has_options: false,
            has_word_count: false,
            has_file_upload: true,
            has_scripture_reference: false,
            label: "Document upload",
            description: "An uploaded file as the response",
        },
    }
}

pub(crate) fn is_free_text(question_type: QuestionType) -> bool {
    type_info(question_type).has_word_count
}

pub(crate) const ALL_TYPES: [QuestionType; 12] = [
    QuestionType::Text,
    QuestionType::Essay,
    QuestionType::YesNo,
    QuestionType::SingleChoice,
    QuestionType::MultipleChoice,
    QuestionType::ScriptureReference,
    QuestionType::DocumentUpload,
    QuestionType::Reflection,
    QuestionType::MinistryPlan,
    QuestionType::TheologicalPosition,
    QuestionType::CaseStudy,
    QuestionType::SermonOutline,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_a_label() {
        for question_type in ALL_TYPES {
            let info = type_info(question_type);
            assert!(!info.label.is_empty(), "{question_type:?} has no label");
            assert!(!info.description.is_empty(), "{question_type:?} has no description");
        }
    }

    #[test]
    fn only_choice_types_have_options() {
        for question_type in ALL_TYPES {
            let expected = matches!(
                question_type,
                QuestionType::SingleChoice | QuestionType::MultipleChoice
            );
            assert_eq!(type_info(question_type).has_options, expected, "{question_type:?}");
        }
    }

    #[test]
    fn free_text_family_has_word_counts() {
        for question_type in [
            QuestionType::Text,
            QuestionType::Essay,
            QuestionType::Reflection,
            QuestionType::MinistryPlan,
            QuestionType::TheologicalPosition,
            QuestionType::CaseStudy,
            QuestionType::SermonOutline,
        ] {
            assert!(is_free_text(question_type), "{question_type:?}");
        }
        assert!(!is_free_text(QuestionType::YesNo));
        assert!(!is_free_text(QuestionType::DocumentUpload));
    }

    #[test]
    fn capability_flags_are_mutually_exclusive() {
        for question_type in ALL_TYPES {
            let info = type_info(question_type);
            let flags = [
                info.has_options,
                info.has_word_count,
                info.has_file_upload,
                info.has_scripture_reference,
            ];
            assert!(flags.iter().filter(|flag| **flag).count() <= 1, "{question_type:?}");
        }
    }
}
