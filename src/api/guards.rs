use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::api::errors::ApiError;
use crate::authz::{build_ability, Ability, Principal};
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentEducator(pub(crate) User);
pub(crate) struct CurrentAbility(pub(crate) Arc<Ability>);

/// Resolves the bearer token into a `User` and `Principal` in request extensions.
///
/// Missing or invalid credentials leave the request anonymous; extractors and
/// the policy guard decide how to reject it.
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = resolve_user(&state, request.headers()).await? {
        request.extensions_mut().insert(Principal::from_user(&user));
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };

    let user_id = match security::verify_token(token, state.settings())
        .and_then(|claims| claims.user_id())
    {
        Ok(user_id) => user_id,
        Err(err) => {
            tracing::debug!(error = %err, "Ignoring invalid bearer token");
            return Ok(None);
        }
    };

    let user = repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    Ok(user.filter(|user| user.is_active))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentEducator
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_educator || user.is_admin {
            Ok(CurrentEducator(user))
        } else {
            Err(ApiError::Forbidden("Educator access required"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAbility
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ability) = parts.extensions.get::<Arc<Ability>>() {
            return Ok(CurrentAbility(ability.clone()));
        }

        let Some(principal) = parts.extensions.get::<Principal>().copied() else {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        };

        let ability = Arc::new(build_ability(&principal));
        parts.extensions.insert(ability.clone());
        Ok(CurrentAbility(ability))
    }
}
