use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAbility, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::api::policy_guard::{authorize, check_policies};
use crate::api::users::authorized_user;
use crate::authz::{Action, AdminAreaPolicy, Policies};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::exams::ExamScope;
use crate::repositories::Page;
use crate::schemas::exam::{EnrollmentListQuery, EnrollmentResponse, ExamListQuery, ExamResponse};
use crate::schemas::user::{AdminUserListQuery, AdminUserUpdate, UserResponse};

pub(crate) fn policies() -> Policies {
    Policies::new().with(AdminAreaPolicy)
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id", patch(update_user))
        .route("/exams", get(list_exams))
        .route("/enrollments", get(list_enrollments))
        .route("/enrollments/:enrollment_id", delete(delete_enrollment))
        .route_layer(middleware::from_fn_with_state(policies(), check_policies))
}

async fn list_users(
    Query(params): Query<AdminUserListQuery>,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let filter = repositories::users::UserFilter {
        email: params.email.map(|email| email.trim().to_ascii_lowercase()),
        is_admin: params.is_admin,
        is_educator: params.is_educator,
        is_active: params.is_active,
    };

    let total_count = repositories::users::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let page = Page::new(params.skip, params.limit);
    let users = repositories::users::list(state.db(), &filter, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(PaginatedResponse {
        items: users.into_iter().map(UserResponse::from_db).collect(),
        total_count,
        skip: page.skip,
        limit: page.limit,
    }))
}

async fn update_user(
    Path(user_id): Path<i64>,
    CurrentUser(admin): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = authorized_user(&state, &ability, user_id, Action::Manage).await?;

    if user.id == admin.id && (payload.is_admin == Some(false) || payload.is_active == Some(false))
    {
        return Err(ApiError::BadRequest(
            "Admins cannot revoke their own admin access".to_string(),
        ));
    }

    let updated = repositories::users::update(
        state.db(),
        user_id,
        repositories::users::UpdateUser {
            is_admin: payload.is_admin,
            is_educator: payload.is_educator,
            is_active: payload.is_active,
            ..Default::default()
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        user_id = admin.id,
        target_user_id = user_id,
        is_admin = updated.is_admin,
        is_educator = updated.is_educator,
        is_active = updated.is_active,
        action = "admin_user_update",
        "User roles updated"
    );

    Ok(Json(UserResponse::from_db(updated)))
}

async fn list_exams(
    Query(params): Query<ExamListQuery>,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ExamResponse>>, ApiError> {
    let total_count = repositories::exams::count(state.db(), ExamScope::All, params.owner_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let page = Page::new(params.skip, params.limit);
    let exams = repositories::exams::list(state.db(), ExamScope::All, params.owner_id, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(PaginatedResponse {
        items: exams.into_iter().map(|exam| ExamResponse::from_db(exam, None)).collect(),
        total_count,
        skip: page.skip,
        limit: page.limit,
    }))
}

async fn list_enrollments(
    Query(params): Query<EnrollmentListQuery>,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<EnrollmentResponse>>, ApiError> {
    let total_count = repositories::enrollments::count(state.db(), params.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;
    let page = Page::new(params.skip, params.limit);
    let enrollments = repositories::enrollments::list(state.db(), params.exam_id, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(PaginatedResponse {
        items: enrollments.into_iter().map(EnrollmentResponse::from_db).collect(),
        total_count,
        skip: page.skip,
        limit: page.limit,
    }))
}

async fn delete_enrollment(
    Path(enrollment_id): Path<i64>,
    CurrentUser(admin): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let Some(enrollment) = repositories::enrollments::find_by_id(state.db(), enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?
    else {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    };
    authorize(&ability, Action::Delete, &enrollment)?;

    repositories::enrollments::delete_by_id(state.db(), enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete enrollment"))?;

    tracing::info!(
        user_id = admin.id,
        enrollment_id,
        exam_id = enrollment.exam_id,
        action = "admin_enrollment_delete",
        "Enrollment removed"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests;
