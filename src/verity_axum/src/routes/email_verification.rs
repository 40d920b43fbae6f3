use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::Secret;
use serde::Deserialize;
use serde_json::json;

use crate::error::AuthApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailVerificationRequest {
    pub email: Secret<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Sends (or re-sends) the verification link.
#[tracing::instrument(name = "Initiate email verification", skip_all)]
pub async fn initiate_email_verification(
    State(state): State<AppState>,
    Json(request): Json<EmailVerificationRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    let redirect_to = request.redirect_to.filter(|url| !url.trim().is_empty());

    state
        .authenticator
        .initiate_email_verification(request.email, redirect_to)
        .await?;

    Ok(Json(json!({ "message": "verification email sent" })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<Secret<String>>,
}

/// Redeems the link. Redirects to the URL stored at issuance when there is one.
#[tracing::instrument(name = "Verify email", skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Response, AuthApiError> {
    let token = query
        .token
        .unwrap_or_else(|| Secret::from(String::new()));

    let redirect = state
        .authenticator
        .validate_email_verification(token)
        .await?;

    Ok(match redirect {
        Some(url) => Redirect::to(&url).into_response(),
        None => Json(json!({ "message": "email verified" })).into_response(),
    })
}
