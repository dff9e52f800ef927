use std::time::Duration;

use crate::api::errors::ApiError;
use crate::api::policy_guard::{authorize, missing};
use crate::authz::{Ability, Action, SubjectType};
use crate::core::state::AppState;
use crate::db::models::{Exam, Section};
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::services::storage::StorageService;

const COVER_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Loads the exam and checks `action` against the instance. A missing exam is
/// 404 only for callers allowed `action` on every exam.
pub(super) async fn authorized_exam(
    state: &AppState,
    ability: &Ability,
    exam_id: i64,
    action: Action,
) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| missing(ability, action, SubjectType::Exam, "Exam not found"))?;
    authorize(ability, action, &exam)?;
    Ok(exam)
}

pub(super) async fn fetch_section(
    state: &AppState,
    exam_id: i64,
    section_id: i64,
) -> Result<Section, ApiError> {
    repositories::sections::find_in_exam(state.db(), exam_id, section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch section"))?
        .ok_or_else(|| ApiError::NotFound("Section not found".to_string()))
}

pub(super) async fn exam_to_response(state: &AppState, exam: Exam) -> ExamResponse {
    let cover_image_url = match (state.storage(), exam.cover_image_key.as_deref()) {
        (Some(storage), Some(key)) => match storage.presign_get(key, COVER_URL_TTL).await {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(error = %err, exam_id = exam.id, "Failed to presign cover image");
                None
            }
        },
        _ => None,
    };

    ExamResponse::from_db(exam, cover_image_url)
}

/// Best-effort removal of a cover object whose row no longer references it.
pub(super) async fn remove_cover_object(storage: &StorageService, exam_id: i64, key: &str) {
    if let Err(err) = storage.delete_object(key).await {
        tracing::warn!(error = %err, exam_id, key, "Failed to delete cover image");
    }
}
