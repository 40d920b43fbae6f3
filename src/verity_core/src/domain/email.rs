use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, Secret};

use super::user::UserError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$")
        .expect("email pattern is a valid regex")
});

/// A syntactically valid, normalised (trimmed + lower-cased) email address.
#[derive(Debug, Clone)]
pub struct Email(Secret<String>);

impl Email {
    /// Local part of the address, before the `@`.
    pub fn local_part(&self) -> &str {
        let address = self.0.expose_secret();
        address.split('@').next().unwrap_or(address)
    }
}

impl TryFrom<Secret<String>> for Email {
    type Error = UserError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let normalised = value.expose_secret().trim().to_lowercase();

        if normalised.is_empty() {
            return Err(UserError::InvalidEmail("email can't be empty".to_string()));
        }

        if !EMAIL_REGEX.is_match(&normalised) {
            return Err(UserError::InvalidEmail(format!(
                "{normalised} is not a valid email address"
            )));
        }

        Ok(Self(Secret::from(normalised)))
    }
}

impl AsRef<Secret<String>> for Email {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for Email {}

impl Hash for Email {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.expose_secret().hash(state);
    }
}
