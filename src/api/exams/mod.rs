mod handlers;
mod helpers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::api::enrollments;
use crate::core::state::AppState;

pub(crate) fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route(
            "/:exam_id",
            get(handlers::get_exam).patch(handlers::update_exam).delete(handlers::delete_exam),
        )
        .route("/:exam_id/publish", post(handlers::publish_exam))
        .route(
            "/:exam_id/cover",
            // Multipart framing needs a little room above the file itself.
            put(handlers::upload_cover).layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024)),
        )
        .route("/:exam_id/sections", get(handlers::list_sections).post(handlers::create_section))
        .route(
            "/:exam_id/sections/:section_id",
            patch(handlers::update_section).delete(handlers::delete_section),
        )
        .route(
            "/:exam_id/sections/:section_id/questions",
            get(handlers::list_questions).post(handlers::create_question),
        )
        .route(
            "/:exam_id/questions/:question_id",
            patch(handlers::update_question).delete(handlers::delete_question),
        )
        .route("/:exam_id/enrollments", post(enrollments::enroll))
}

#[cfg(test)]
mod tests;
