use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use thiserror::Error;
use verity_core::{AuthValidator, AuthenticatedClaims, TokenCodec};

const BEARER_SCHEME: &str = "Bearer";

/// Validates `Authorization: Bearer <access token>` headers.
#[derive(Clone)]
pub struct BearerTokenValidator {
    codec: Arc<dyn TokenCodec>,
}

impl BearerTokenValidator {
    pub fn new(codec: Arc<dyn TokenCodec>) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl AuthValidator for BearerTokenValidator {
    type Claims = AuthenticatedClaims;
    type RequestParts = http::request::Parts;
    type Error = BearerAuthError;

    async fn validate(&self, parts: &Self::RequestParts) -> Result<Self::Claims, Self::Error> {
        let token = extract_bearer_token(&parts.headers)?;

        let claims = self
            .codec
            .verify(token)
            .map_err(|_| BearerAuthError::InvalidToken)?;

        AuthenticatedClaims::try_from(claims).map_err(|e| {
            tracing::debug!(error = %e, "token claims rejected");
            BearerAuthError::InvalidToken
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BearerAuthError {
    #[error("missing authorization header")]
    MissingToken,
    #[error("invalid authorization header format")]
    MalformedHeader,
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Pulls the token out of the `Authorization` header. The scheme is matched
/// case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, BearerAuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(BearerAuthError::MissingToken)?
        .to_str()
        .map_err(|_| BearerAuthError::MalformedHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(BearerAuthError::MalformedHeader)?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(BearerAuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(BearerAuthError::MalformedHeader);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use secrecy::Secret;
    use serde_json::{Map, Value};
    use uuid::Uuid;
    use verity_core::{SESSION_ID_CLAIM, SessionId, UserId};

    use super::*;
    use crate::auth_validation::jwt_codec::{JwtConfig, JwtTokenCodec};

    fn codec() -> Arc<JwtTokenCodec> {
        Arc::new(JwtTokenCodec::new(JwtConfig {
            secret: Secret::from("bearer-test-secret".to_string()),
            algorithm: Algorithm::HS256,
            issuer: "verity-test".to_string(),
            access_token_ttl: Duration::minutes(5),
            refresh_token_ttl: Duration::days(1),
        }))
    }

    fn parts(authorization: Option<&str>) -> http::request::Parts {
        let mut builder = http::Request::builder().uri("/api/v1/auth/me");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn access_token(codec: &JwtTokenCodec, user_id: UserId, session_id: SessionId) -> String {
        let mut payload = Map::new();
        payload.insert(
            SESSION_ID_CLAIM.to_string(),
            Value::String(session_id.to_string()),
        );
        payload.insert("aud".to_string(), Value::String("client-app".to_string()));
        codec.sign_access(payload, &user_id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn valid_access_token_yields_claims() {
        let codec = codec();
        let validator = BearerTokenValidator::new(codec.clone());
        let user_id = UserId::new();
        let session_id = SessionId::new();
        let token = access_token(&codec, user_id, session_id);

        let claims = validator
            .validate(&parts(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.audience.as_deref(), Some("client-app"));
    }

    #[tokio::test]
    async fn scheme_is_case_insensitive() {
        let codec = codec();
        let validator = BearerTokenValidator::new(codec.clone());
        let token = access_token(&codec, UserId::new(), SessionId::new());

        assert!(
            validator
                .validate(&parts(Some(&format!("bearer {token}"))))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_rejected() {
        let validator = BearerTokenValidator::new(codec());

        assert_eq!(
            validator.validate(&parts(None)).await.unwrap_err(),
            BearerAuthError::MissingToken
        );
        assert_eq!(
            validator
                .validate(&parts(Some("Basic dXNlcjpwYXNz")))
                .await
                .unwrap_err(),
            BearerAuthError::MalformedHeader
        );
        assert_eq!(
            validator.validate(&parts(Some("Bearer"))).await.unwrap_err(),
            BearerAuthError::MalformedHeader
        );
    }

    #[tokio::test]
    async fn refresh_token_is_not_accepted_as_bearer() {
        let codec = codec();
        let validator = BearerTokenValidator::new(codec.clone());
        let refresh = codec
            .sign_refresh(&UserId::new(), "client-app", &Uuid::now_v7())
            .unwrap();

        assert_eq!(
            validator
                .validate(&parts(Some(&format!("Bearer {refresh}"))))
                .await
                .unwrap_err(),
            BearerAuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let validator = BearerTokenValidator::new(codec());

        assert_eq!(
            validator
                .validate(&parts(Some("Bearer not-a-token")))
                .await
                .unwrap_err(),
            BearerAuthError::InvalidToken
        );
    }
}
