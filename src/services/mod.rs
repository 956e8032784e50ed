pub(crate) mod answer_validation;
pub(crate) mod attachments;
pub(crate) mod question_order;
pub(crate) mod question_types;
pub(crate) mod scoring;
pub(crate) mod storage;
pub(crate) mod submission_lifecycle;
