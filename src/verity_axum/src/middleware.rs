use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use verity_core::{AuthValidator, AuthenticatedClaims};

use crate::error::AuthApiError;
use crate::state::AppState;

/// Rejects requests without a valid access token and stores the validated
/// claims as a request extension.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthApiError> {
    let (mut parts, body) = request.into_parts();

    let claims = state.validator.validate(&parts).await.map_err(|e| {
        tracing::debug!(error = %e, path = %parts.uri.path(), "bearer token rejected");
        AuthApiError::from(e)
    })?;
    parts.extensions.insert(claims);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Claims of the caller, available behind [`require_bearer`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthenticatedClaims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedClaims>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| AuthApiError::Unauthorized("missing authorization header".to_string()))
    }
}
