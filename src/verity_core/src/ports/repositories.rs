use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    credential::UserPassword,
    email::Email,
    one_time_token::{OneTimeToken, TokenSubject},
    session::{RefreshToken, Session},
    token_hash::TokenHash,
    user::{User, UserId},
};

// UserStore port trait and errors
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UserAlreadyExists, Self::UserAlreadyExists)
                | (Self::UserNotFound, Self::UserNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

/// The user directory as seen by the authentication core.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn add_user(&self, user: User) -> Result<(), UserStoreError>;
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, UserStoreError>;
    async fn user_exists(&self, id: &UserId) -> Result<bool, UserStoreError>;
    async fn mark_email_verified(
        &self,
        id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError>;
}

// OneTimeTokenStore port trait and errors
#[derive(Debug, Error)]
pub enum OneTimeTokenStoreError {
    #[error("A token is already pending for this user and subject")]
    AlreadyPending,
    #[error("Token not found")]
    TokenNotFound,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for OneTimeTokenStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::AlreadyPending, Self::AlreadyPending)
                | (Self::TokenNotFound, Self::TokenNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait]
pub trait OneTimeTokenStore: Send + Sync {
    /// Every stored token for the pair, expired ones included.
    async fn find_pending(
        &self,
        user_id: &UserId,
        subject: TokenSubject,
    ) -> Result<Vec<OneTimeToken>, OneTimeTokenStoreError>;
    async fn create_token(&self, token: OneTimeToken) -> Result<(), OneTimeTokenStoreError>;
    async fn touch_last_sent(
        &self,
        id: &Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), OneTimeTokenStoreError>;
    async fn delete_token(&self, id: &Uuid) -> Result<(), OneTimeTokenStoreError>;
    async fn get_token_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<OneTimeToken>, OneTimeTokenStoreError>;
}

// CredentialStore port trait and errors
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("Password already set")]
    PasswordAlreadySet,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for CredentialStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::PasswordAlreadySet, Self::PasswordAlreadySet)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_password(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserPassword>, CredentialStoreError>;
    /// Fails with `PasswordAlreadySet` when the user already owns a password row.
    async fn create_password(&self, password: UserPassword) -> Result<(), CredentialStoreError>;
    /// Replaces the stored hash, creating the row if needed.
    async fn upsert_password(&self, password: UserPassword) -> Result<(), CredentialStoreError>;
}

// SessionStore port trait and errors
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: Session) -> Result<(), SessionStoreError>;
    async fn create_refresh_token(&self, token: RefreshToken) -> Result<(), SessionStoreError>;

    /// Persists a session and its refresh token.
    ///
    /// The default writes them one after the other; stores that support
    /// transactions should make the pair atomic.
    async fn create_session_with_refresh_token(
        &self,
        session: Session,
        token: RefreshToken,
    ) -> Result<(), SessionStoreError> {
        self.create_session(session).await?;
        self.create_refresh_token(token).await
    }
}
