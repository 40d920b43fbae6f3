use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::email::Email;

#[derive(Debug, Error, PartialEq)]
pub enum UserError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Invalid password: {0}")]
    InvalidPassword(String),
    #[error("Invalid display name: {0}")]
    InvalidDisplayName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

const DISPLAY_NAME_MIN: usize = 10;
const DISPLAY_NAME_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl TryFrom<String> for DisplayName {
    type Error = UserError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let length = trimmed.chars().count();

        if !(DISPLAY_NAME_MIN..=DISPLAY_NAME_MAX).contains(&length) {
            return Err(UserError::InvalidDisplayName(format!(
                "display name must be between {DISPLAY_NAME_MIN} and {DISPLAY_NAME_MAX} characters"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

static USERNAME_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("username pattern is a valid regex"));

/// Derives a username from the local part of an email address.
pub fn derive_username(email: &Email) -> String {
    let local = email.local_part().to_lowercase();
    let sanitized = USERNAME_DISALLOWED.replace_all(&local, "");

    if sanitized.is_empty() {
        "user".to_string()
    } else {
        sanitized.into_owned()
    }
}

/// The user view the authentication core works with.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub username: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl User {
    /// A freshly registered, unverified user.
    pub fn new(display_name: DisplayName, email: Email, now: DateTime<Utc>) -> Self {
        let username = derive_username(&email);

        Self {
            id: UserId::new(),
            display_name: display_name.0,
            username,
            email,
            created_at: now,
            updated_at: None,
            email_verified_at: None,
        }
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}
