use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAbility, CurrentUser};
use crate::api::policy_guard::{authorize, missing};
use crate::authz::{Action, SubjectType};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::EnrollmentResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(my_enrollments))
}

/// `POST /exams/:exam_id/enrollments`: the caller enrolls themselves.
pub(crate) async fn enroll(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| missing(&ability, Action::Read, SubjectType::Exam, "Exam not found"))?;

    authorize(&ability, Action::Read, &exam)?;

    if !exam.is_published {
        return Err(ApiError::BadRequest("Exam is not published".to_string()));
    }

    let enrollment =
        repositories::enrollments::create(state.db(), exam_id, user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create enrollment"))?
            .ok_or_else(|| ApiError::Conflict("Already enrolled in this exam".to_string()))?;

    tracing::info!(
        user_id = user.id,
        exam_id,
        enrollment_id = enrollment.id,
        action = "exam_enroll",
        "User enrolled"
    );

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn my_enrollments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let enrollments = repositories::enrollments::list_for_user(state.db(), user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(enrollments.into_iter().map(EnrollmentResponse::from_db).collect()))
}
