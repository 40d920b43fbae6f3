use std::fmt::Display;

use thiserror::Error;
use verity_core::{
    CredentialStoreError, OneTimeTokenStoreError, PasswordHasherError, SessionStoreError,
    TokenCodecError, UserError, UserStoreError,
};

/// Coarse classification the transport layer maps onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidInput,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Every failure the authentication flows surface to their callers.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    /// Unknown email, wrong password and unverified email all end up here.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::InvalidInput(_) => AuthErrorKind::InvalidInput,
            AuthError::InvalidCredentials | AuthError::Unauthorized => AuthErrorKind::Unauthorized,
            AuthError::NotFound(_) => AuthErrorKind::NotFound,
            AuthError::Conflict(_) => AuthErrorKind::Conflict,
            AuthError::Internal(_) => AuthErrorKind::Internal,
        }
    }

    /// Logs `error` inside the current span and wraps it as `Internal`.
    pub(crate) fn internal(error: impl Display) -> Self {
        let message = error.to_string();
        tracing::error!(error = %message, "unexpected failure");
        AuthError::Internal(message)
    }

    /// Re-labels anything that isn't already internal as internal.
    pub(crate) fn into_internal(self) -> Self {
        match self {
            AuthError::Internal(_) => self,
            other => AuthError::internal(other),
        }
    }
}

impl PartialEq for AuthError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Internal(_), Self::Internal(_)) => true,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::Unauthorized, Self::Unauthorized) => true,
            _ => false,
        }
    }
}

impl From<UserError> for AuthError {
    fn from(error: UserError) -> Self {
        AuthError::InvalidInput(error.to_string())
    }
}

impl From<UserStoreError> for AuthError {
    fn from(error: UserStoreError) -> Self {
        match error {
            UserStoreError::UserAlreadyExists => {
                AuthError::Conflict("a user with this email already exists".to_string())
            }
            UserStoreError::UserNotFound => AuthError::NotFound("user"),
            UserStoreError::UnexpectedError(e) => AuthError::internal(e),
        }
    }
}

impl From<OneTimeTokenStoreError> for AuthError {
    fn from(error: OneTimeTokenStoreError) -> Self {
        match error {
            OneTimeTokenStoreError::AlreadyPending => AuthError::Conflict(
                "a token is already being issued for this user, try again".to_string(),
            ),
            OneTimeTokenStoreError::TokenNotFound => AuthError::Unauthorized,
            OneTimeTokenStoreError::UnexpectedError(e) => AuthError::internal(e),
        }
    }
}

impl From<CredentialStoreError> for AuthError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::PasswordAlreadySet => {
                AuthError::Conflict("password is already set".to_string())
            }
            CredentialStoreError::UnexpectedError(e) => AuthError::internal(e),
        }
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(error: SessionStoreError) -> Self {
        AuthError::internal(error)
    }
}

impl From<PasswordHasherError> for AuthError {
    fn from(error: PasswordHasherError) -> Self {
        AuthError::internal(error)
    }
}

impl From<TokenCodecError> for AuthError {
    fn from(error: TokenCodecError) -> Self {
        match error {
            TokenCodecError::Unauthorized => AuthError::Unauthorized,
            other => AuthError::internal(other),
        }
    }
}
