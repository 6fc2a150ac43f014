//! Authentication Middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::permissions::Actor;

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Middleware to require authentication.
///
/// Extracts Bearer token from Authorization header, validates JWT,
/// loads the user's global role, and injects an [`Actor`] into request extensions.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_access_token(token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;

    // Global role is read per request so demotions apply immediately
    let global_role = state
        .users
        .find_global_role(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    request
        .extensions_mut()
        .insert(Actor::new(user_id, global_role));

    Ok(next.run(request).await)
}

/// Extractor for the authenticated actor in handlers.
///
/// ```ignore
/// async fn protected_handler(actor: Actor) -> impl IntoResponse {
///     format!("Hello, {}!", actor.id)
/// }
/// ```
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or(AuthError::MissingAuthHeader)
    }
}
