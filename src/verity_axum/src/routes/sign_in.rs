use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName},
    response::IntoResponse,
};
use axum_extra::{TypedHeader, headers::UserAgent};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use verity_application::SignInRequest;
use verity_core::{ClientMetadata, SessionId, UserId};

use crate::error::AuthApiError;
use crate::state::AppState;

pub const APP_AUDIENCE_HEADER: HeaderName = HeaderName::from_static("x-app-audience");
const FORWARDED_FOR_HEADER: HeaderName = HeaderName::from_static("x-forwarded-for");

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub email: Secret<String>,
    pub password: Secret<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignedInUser {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub user: SignedInUser,
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: SessionId,
    pub token_expiry: DateTime<Utc>,
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[tracing::instrument(name = "Sign in", skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    headers: HeaderMap,
    Json(body): Json<SignInBody>,
) -> Result<impl IntoResponse, AuthApiError> {
    let client = ClientMetadata {
        user_agent: user_agent.map(|TypedHeader(agent)| agent.as_str().to_string()),
        device_name: body.device_name,
        device_fingerprint: body.device_fingerprint,
        ip_address: header_str(&headers, &FORWARDED_FOR_HEADER)
            .and_then(|chain| chain.split(',').next().map(|ip| ip.trim().to_string())),
    };

    let request = SignInRequest {
        email: body.email,
        password: body.password,
        audience: header_str(&headers, &APP_AUDIENCE_HEADER),
        client,
    };

    let signed_in = state.authenticator.sign_in_with_email(request).await?;

    Ok(Json(SignInResponse {
        user: SignedInUser {
            id: signed_in.user.id,
            email: signed_in.user.email.as_ref().expose_secret().clone(),
            display_name: signed_in.user.display_name,
            username: signed_in.user.username,
        },
        access_token: signed_in.access_token.expose_secret().clone(),
        refresh_token: signed_in.refresh_token.expose_secret().clone(),
        session_id: signed_in.session_id,
        token_expiry: signed_in.token_expiry,
    }))
}
