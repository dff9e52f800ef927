use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAbility, CurrentEducator, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::authz::{Action, Principal};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::Page;
use crate::repositories::exams::ExamScope;
use crate::schemas::exam::{ExamCreate, ExamListQuery, ExamResponse, ExamUpdate};

use super::super::helpers;

pub(in crate::api::exams) async fn create_exam(
    State(state): State<AppState>,
    CurrentEducator(user): CurrentEducator,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate()?;

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            owner_id: user.id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            duration_minutes: payload.duration_minutes,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(user_id = user.id, exam_id = exam.id, action = "exam_create", "Exam created");

    Ok((StatusCode::CREATED, Json(helpers::exam_to_response(&state, exam).await)))
}

/// Narrows the SQL candidate set to what the principal's read rules can reach.
fn read_scope(principal: Principal) -> ExamScope {
    if principal.is_admin {
        ExamScope::All
    } else if principal.is_educator {
        ExamScope::PublishedOrOwnedBy(principal.id)
    } else {
        ExamScope::Published
    }
}

pub(in crate::api::exams) async fn list_exams(
    Query(params): Query<ExamListQuery>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ExamResponse>>, ApiError> {
    let scope = read_scope(Principal::from_user(&user));

    let total_count = repositories::exams::count(state.db(), scope, params.owner_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let page = Page::new(params.skip, params.limit);
    let exams = repositories::exams::list(state.db(), scope, params.owner_id, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut items = Vec::with_capacity(exams.len());
    for exam in exams {
        if ability.can(Action::Read, &exam) {
            items.push(helpers::exam_to_response(&state, exam).await);
        }
    }

    Ok(Json(PaginatedResponse { items, total_count, skip: page.skip, limit: page.limit }))
}

pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<i64>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = helpers::authorized_exam(&state, &ability, exam_id, Action::Read).await?;
    Ok(Json(helpers::exam_to_response(&state, exam).await))
}

pub(in crate::api::exams) async fn update_exam(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate()?;
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;

    let exam = repositories::exams::update(
        state.db(),
        exam_id,
        repositories::exams::UpdateExam {
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            duration_minutes: payload.duration_minutes,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;

    tracing::info!(user_id = user.id, exam_id, action = "exam_update", "Exam updated");

    Ok(Json(helpers::exam_to_response(&state, exam).await))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    helpers::authorized_exam(&state, &ability, exam_id, Action::Delete).await?;

    let cover_key = repositories::exams::delete_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if let (Some(storage), Some(key)) = (state.storage(), cover_key.as_deref()) {
        helpers::remove_cover_object(storage, exam_id, key).await;
    }

    tracing::info!(user_id = user.id, exam_id, action = "exam_delete", "Exam deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub(in crate::api::exams) async fn publish_exam(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;

    if exam.is_published {
        return Err(ApiError::BadRequest("Exam is already published".to_string()));
    }

    let questions = repositories::exams::count_questions(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    if questions == 0 {
        return Err(ApiError::BadRequest("Exam must contain at least one question".to_string()));
    }

    let exam = repositories::exams::publish(state.db(), exam_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish exam"))?;

    tracing::info!(user_id = user.id, exam_id, action = "exam_publish", "Exam published");

    Ok(Json(helpers::exam_to_response(&state, exam).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_scope_follows_principal_flags() {
        let admin = Principal { id: 1, is_admin: true, is_educator: true };
        let educator = Principal { id: 2, is_admin: false, is_educator: true };
        let plain = Principal { id: 3, is_admin: false, is_educator: false };

        assert!(matches!(read_scope(admin), ExamScope::All));
        assert!(matches!(read_scope(educator), ExamScope::PublishedOrOwnedBy(2)));
        assert!(matches!(read_scope(plain), ExamScope::Published));
    }
}
