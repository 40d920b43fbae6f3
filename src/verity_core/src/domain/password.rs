use secrecy::{ExposeSecret, Secret};

use super::user::UserError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A plaintext password that satisfies the minimum length policy.
///
/// Only ever held transiently; the credential validator turns it into a
/// [`HashedPassword`](super::credential::HashedPassword) before anything is stored.
#[derive(Debug, Clone)]
pub struct Password(Secret<String>);

impl TryFrom<Secret<String>> for Password {
    type Error = UserError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let password = value.expose_secret();

        if password.is_empty() {
            return Err(UserError::InvalidPassword(
                "password can't be empty".to_string(),
            ));
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserError::InvalidPassword(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        Ok(Self(value))
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}
