use axum::extract::{Multipart, Path, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAbility, CurrentUser};
use crate::api::validation::validate_image_upload;
use crate::authz::Action;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::services::storage::cover_image_key;

use super::super::helpers;

pub(in crate::api::exams) async fn upload_cover(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExamResponse>, ApiError> {
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;

    let storage = state
        .storage()
        .ok_or_else(|| ApiError::ServiceUnavailable("File storage is not configured".to_string()))?;

    let max_bytes = state.settings().max_upload_bytes();
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        filename = field.file_name().map(|s| s.to_string());
        content_type = field.content_type().map(|s| s.to_string());
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    state.settings().storage().max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    if file_bytes.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }
    let filename = filename.unwrap_or_default();
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    let extension = validate_image_upload(
        &filename,
        &content_type,
        &state.settings().storage().allowed_image_extensions,
    )?;

    let key = cover_image_key(exam_id, &extension);
    let stored = storage
        .upload_bytes(&key, &content_type, file_bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload cover image"))?;

    // The row lock decides which of two overlapping uploads replaced which key.
    let written =
        repositories::exams::set_cover_image(state.db(), exam_id, &key, primitive_now_utc()).await;
    let replaced = match written {
        Ok(Some(replaced)) => replaced,
        Ok(None) => {
            helpers::remove_cover_object(storage, exam_id, &key).await;
            return Err(ApiError::NotFound("Exam not found".to_string()));
        }
        Err(err) => {
            helpers::remove_cover_object(storage, exam_id, &key).await;
            return Err(ApiError::internal(err, "Failed to store cover image"));
        }
    };

    if let Some(previous) = replaced.previous_cover_image_key.as_deref() {
        if previous != key {
            helpers::remove_cover_object(storage, exam_id, previous).await;
        }
    }

    tracing::info!(
        user_id = user.id,
        exam_id,
        size = stored.size,
        sha256 = %stored.sha256,
        action = "exam_cover_upload",
        "Exam cover uploaded"
    );

    Ok(Json(helpers::exam_to_response(&state, replaced.exam).await))
}
