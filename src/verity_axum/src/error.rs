use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use verity_adapters::BearerAuthError;
use verity_application::{AuthError, AuthErrorKind};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal,
}

impl AuthApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthApiError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthApiError::Conflict(_) => StatusCode::CONFLICT,
            AuthApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (self.status_code(), body).into_response()
    }
}

impl From<AuthError> for AuthApiError {
    fn from(error: AuthError) -> Self {
        // Internal details were logged where the failure happened.
        match error.kind() {
            AuthErrorKind::InvalidInput => AuthApiError::InvalidInput(error.to_string()),
            AuthErrorKind::Unauthorized => AuthApiError::Unauthorized(error.to_string()),
            AuthErrorKind::NotFound => AuthApiError::NotFound(error.to_string()),
            AuthErrorKind::Conflict => AuthApiError::Conflict(error.to_string()),
            AuthErrorKind::Internal => AuthApiError::Internal,
        }
    }
}

impl From<BearerAuthError> for AuthApiError {
    fn from(error: BearerAuthError) -> Self {
        AuthApiError::Unauthorized(error.to_string())
    }
}
