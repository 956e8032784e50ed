pub(crate) mod helpers;

use axum::{routing::get, routing::post, Router};
use serde::Deserialize;

use crate::core::state::AppState;
use crate::db::types::{SubmissionStatus, TestStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct ListTestsQuery {
    #[serde(default)]
    pub(crate) status: Option<TestStatus>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListSubmissionsQuery {
    #[serde(default)]
    pub(crate) status: Option<SubmissionStatus>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        // Staff endpoints
        .route("/", post(manage::create_test).get(manage::list_tests))
        .route("/:test_id", get(manage::get_test).patch(manage::update_test))
        .route("/:test_id/publish", post(manage::publish_test))
        .route("/:test_id/archive", post(manage::archive_test))
        .route("/:test_id/questions", post(manage::add_question))
        .route("/:test_id/submissions", get(manage::list_submissions))
        // Student endpoints
        .route("/:test_id/status", get(student::get_test_status))
        .route("/:test_id/start", post(student::start_test))
}
