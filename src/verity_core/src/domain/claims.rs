use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::session::SessionId;
use super::user::UserId;

/// Payload key carrying the user id inside access tokens.
pub const USER_ID_CLAIM: &str = "user_id";
/// Payload key carrying the email address inside access tokens.
pub const EMAIL_CLAIM: &str = "email";
/// Payload key carrying the session id inside access tokens.
pub const SESSION_ID_CLAIM: &str = "sid";

/// Claim names owned by the codec. Payload entries with these names never
/// override what the codec sets itself.
pub const RESERVED_CLAIMS: [&str; 5] = ["iss", "iat", "exp", "typ", "sub"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Full claim set of a signed token.
///
/// Registered claims are typed; anything else the caller supplied lives in
/// `extra` and is flattened into the JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn is_access(&self) -> bool {
        self.typ == TokenType::Access
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ClaimsError {
    #[error("token is not an access token")]
    NotAccessToken,
    #[error("token has no valid subject")]
    MissingSubject,
    #[error("token has no valid session id")]
    MissingSessionId,
}

/// What the bearer-token middleware hands to protected handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedClaims {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub audience: Option<String>,
}

impl TryFrom<TokenClaims> for AuthenticatedClaims {
    type Error = ClaimsError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        if !claims.is_access() {
            return Err(ClaimsError::NotAccessToken);
        }

        let user_id = claims
            .sub
            .as_deref()
            .and_then(|sub| sub.parse::<UserId>().ok())
            .ok_or(ClaimsError::MissingSubject)?;

        let session_id = claims
            .extra
            .get(SESSION_ID_CLAIM)
            .and_then(Value::as_str)
            .and_then(|sid| sid.parse::<SessionId>().ok())
            .ok_or(ClaimsError::MissingSessionId)?;

        Ok(Self {
            user_id,
            session_id,
            audience: claims.aud,
        })
    }
}
