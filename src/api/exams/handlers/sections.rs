use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAbility, CurrentUser};
use crate::authz::Action;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{SectionCreate, SectionResponse, SectionUpdate};

use super::super::helpers;

pub(in crate::api::exams) async fn list_sections(
    Path(exam_id): Path<i64>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, ApiError> {
    helpers::authorized_exam(&state, &ability, exam_id, Action::Read).await?;

    let sections = repositories::sections::list_by_exam(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list sections"))?;

    Ok(Json(sections.into_iter().map(SectionResponse::from_db).collect()))
}

pub(in crate::api::exams) async fn create_section(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<SectionCreate>,
) -> Result<(StatusCode, Json<SectionResponse>), ApiError> {
    payload.validate()?;
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;

    let section = repositories::sections::create(
        state.db(),
        repositories::sections::CreateSection {
            exam_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            order_index: payload.order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create section"))?;

    tracing::info!(
        user_id = user.id,
        exam_id,
        section_id = section.id,
        action = "section_create",
        "Section created"
    );

    Ok((StatusCode::CREATED, Json(SectionResponse::from_db(section))))
}

pub(in crate::api::exams) async fn update_section(
    Path((exam_id, section_id)): Path<(i64, i64)>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<SectionUpdate>,
) -> Result<Json<SectionResponse>, ApiError> {
    payload.validate()?;
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;
    helpers::fetch_section(&state, exam_id, section_id).await?;

    let section = repositories::sections::update(
        state.db(),
        section_id,
        repositories::sections::UpdateSection {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            order_index: payload.order_index,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update section"))?;

    Ok(Json(SectionResponse::from_db(section)))
}

pub(in crate::api::exams) async fn delete_section(
    Path((exam_id, section_id)): Path<(i64, i64)>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;
    helpers::fetch_section(&state, exam_id, section_id).await?;

    repositories::sections::delete_by_id(state.db(), section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete section"))?;

    tracing::info!(user_id = user.id, exam_id, section_id, action = "section_delete", "Section deleted");

    Ok(StatusCode::NO_CONTENT)
}
