use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use verity_core::UserId;

use crate::error::AuthApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub display_name: String,
    pub email: Secret<String>,
    pub password: Secret<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    pub id: UserId,
    pub username: String,
}

#[tracing::instrument(name = "Register user", skip_all)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    let user = state
        .authenticator
        .register_user(request.display_name, request.email, request.password)
        .await?;

    let body = RegisterUserResponse {
        id: user.id,
        username: user.username,
    };
    Ok((StatusCode::CREATED, Json(body)))
}
