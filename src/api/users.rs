use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAbility, CurrentUser};
use crate::api::policy_guard::{authorize, missing};
use crate::api::validation::validate_password_len;
use crate::authz::{Ability, Action, SubjectType};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::user::{UserResponse, UserUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/:user_id", get(get_user).patch(update_user))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

/// Loads the user and checks `action` against the row.
pub(crate) async fn authorized_user(
    state: &AppState,
    ability: &Ability,
    user_id: i64,
    action: Action,
) -> Result<User, ApiError> {
    let user = repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| missing(ability, action, SubjectType::User, "User not found"))?;
    authorize(ability, action, &user)?;
    Ok(user)
}

async fn get_user(
    Path(user_id): Path<i64>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = authorized_user(&state, &ability, user_id, Action::Read).await?;

    Ok(Json(UserResponse::from_db(user)))
}

async fn update_user(
    Path(user_id): Path<i64>,
    CurrentUser(caller): CurrentUser,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate()?;

    authorized_user(&state, &ability, user_id, Action::Update).await?;

    let hashed_password = match payload.password.as_deref() {
        Some(password) => {
            validate_password_len(password)?;
            Some(
                security::hash_password(password)
                    .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
            )
        }
        None => None,
    };
    let password_changed = hashed_password.is_some();

    let updated = repositories::users::update(
        state.db(),
        user_id,
        repositories::users::UpdateUser {
            full_name: payload.full_name.map(|name| name.trim().to_string()),
            hashed_password,
            ..Default::default()
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        user_id = caller.id,
        target_user_id = user_id,
        password_changed,
        action = "user_update",
        "User profile updated"
    );

    Ok(Json(UserResponse::from_db(updated)))
}
