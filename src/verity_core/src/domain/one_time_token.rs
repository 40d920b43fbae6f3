use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::token_hash::{TokenHash, hash_token};
use super::user::UserId;

/// Random bytes behind every one-time secret (64 URL-safe characters once encoded).
const SECRET_BYTES: usize = 48;

pub const REDIRECT_TO_METADATA_KEY: &str = "redirect_to";

/// Purpose tag of a one-time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSubject {
    EmailVerification,
}

impl TokenSubject {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSubject::EmailVerification => "email_verification",
        }
    }
}

impl fmt::Display for TokenSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown token subject: {0}")]
pub struct UnknownTokenSubject(pub String);

impl FromStr for TokenSubject {
    type Err = UnknownTokenSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(TokenSubject::EmailVerification),
            other => Err(UnknownTokenSubject(other.to_string())),
        }
    }
}

/// The raw secret handed to the user out-of-band. Never persisted.
#[derive(Debug, Clone)]
pub struct OneTimeSecret(Secret<String>);

impl OneTimeSecret {
    /// Generates a fresh secret from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(Secret::from(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn hash(&self) -> TokenHash {
        hash_token(self.0.expose_secret())
    }
}

impl From<Secret<String>> for OneTimeSecret {
    fn from(secret: Secret<String>) -> Self {
        Self(secret)
    }
}

impl AsRef<Secret<String>> for OneTimeSecret {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub subject: TokenSubject,
    pub token_hash: TokenHash,
    pub relates_to: String,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_sent_at: Option<DateTime<Utc>>,
}

impl OneTimeToken {
    pub fn new(
        user_id: Option<UserId>,
        subject: TokenSubject,
        token_hash: TokenHash,
        relates_to: String,
        metadata: Map<String, Value>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            subject,
            token_hash,
            relates_to,
            metadata,
            created_at: now,
            expires_at: now + ttl,
            last_sent_at: None,
        }
    }

    /// A stored token is usable only strictly before its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.metadata
            .get(REDIRECT_TO_METADATA_KEY)
            .and_then(Value::as_str)
    }
}
