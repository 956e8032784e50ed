pub(crate) mod helpers;
mod staff;
mod student;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        // Student endpoints
        .route("/my", get(student::my_submissions))
        .route("/:submission_id", get(student::get_submission))
        .route("/:submission_id/answers", put(student::write_answer))
        .route("/:submission_id/submit", post(student::submit))
        .route(
            "/:submission_id/questions/:question_id/file",
            post(student::upload_file).delete(student::delete_file),
        )
        // Staff endpoints
        .route("/:submission_id/grade", post(staff::grade_submission))
        .route("/:submission_id/return", post(staff::return_submission))
}
