use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    claims::TokenClaims,
    credential::HashedPassword,
    email::Email,
    password::Password,
    user::UserId,
};

/// Named mail template together with the data it renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    EmailVerification {
        display_name: String,
        verify_url: String,
        app_name: String,
    },
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::EmailVerification { .. } => "email_verification",
        }
    }
}

/// Port trait for email sending service
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(
        &self,
        recipients: &[Email],
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), String>;
}

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Credential validator: salted, slow one-way hashing of passwords.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &Password) -> Result<HashedPassword, PasswordHasherError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash can't be used.
    async fn validate(
        &self,
        password: &Password,
        hash: &HashedPassword,
    ) -> Result<bool, PasswordHasherError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenCodecError {
    #[error("Signing secret is not configured")]
    MissingSecret,
    /// Any verification failure. Deliberately carries no detail.
    #[error("Invalid token")]
    Unauthorized,
    #[error("Failed to sign token: {0}")]
    Signing(String),
    /// A registered claim in the payload had the wrong JSON type.
    #[error("Claim `{0}` must be a string")]
    InvalidClaim(&'static str),
}

/// Signs and verifies compact signed tokens.
pub trait TokenCodec: Send + Sync {
    /// Access token: `payload` is flattened into the claims, `subject` becomes `sub`.
    fn sign_access(
        &self,
        payload: Map<String, Value>,
        subject: &str,
    ) -> Result<String, TokenCodecError>;

    /// Refresh token bound to a user, an audience and the id of its stored record.
    fn sign_refresh(
        &self,
        user_id: &UserId,
        audience: &str,
        token_id: &Uuid,
    ) -> Result<String, TokenCodecError>;

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenCodecError>;

    fn access_token_ttl(&self) -> Duration;

    fn refresh_token_ttl(&self) -> Duration;
}
