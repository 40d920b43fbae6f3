use axum::{Json, extract::State, http::StatusCode};
use secrecy::Secret;
use serde::Deserialize;

use crate::error::AuthApiError;
use crate::middleware::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: Secret<String>,
}

/// Replaces the caller's password.
#[tracing::instrument(name = "Update password", skip_all, fields(user_id = %claims.user_id))]
pub async fn update_password(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, AuthApiError> {
    state
        .authenticator
        .update_user_password(claims.user_id, request.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
