use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{normalize_email, validate_password_len};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserCreate, UserLogin, UserResponse};

/// Max attempts per window for auth endpoints (login/signup).
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate()?;
    validate_password_len(&payload.password)?;
    let email = normalize_email(&payload.email);

    enforce_rate_limit(&state, "signup", &email, "Too many signup attempts, try again later")
        .await?;

    let existing = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            email: &email,
            hashed_password,
            full_name: payload.full_name.trim(),
            is_admin: false,
            is_educator: false,
            is_active: true,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(user_id = user.id, action = "signup", "User registered");

    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    enforce_rate_limit(&state, "login", &email, "Too many login attempts, try again later").await?;

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    Ok(Json(token_response(&state, user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

/// Redis failures fail open; the endpoint stays usable without a cache.
async fn enforce_rate_limit(
    state: &AppState,
    scope: &str,
    email: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    let allowed = state
        .redis()
        .rate_limit(scope, email, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, scope, "Rate limiter unavailable");
            true
        });

    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests(message))
    }
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    })
}

#[cfg(test)]
mod tests;
