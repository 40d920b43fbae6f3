use chrono::{DateTime, Utc};
use secrecy::Secret;

use super::user::UserId;

/// Self-describing password hash (algorithm, parameters and salt included).
#[derive(Debug, Clone)]
pub struct HashedPassword(Secret<String>);

impl HashedPassword {
    pub fn new(hash: Secret<String>) -> Self {
        Self(hash)
    }
}

impl AsRef<Secret<String>> for HashedPassword {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

/// The single password row a user may own.
#[derive(Debug, Clone)]
pub struct UserPassword {
    pub user_id: UserId,
    pub password_hash: HashedPassword,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
