pub mod auth_validation;
pub mod config;
pub mod crypto;
pub mod email;
pub mod persistence;

pub use auth_validation::{
    BearerAuthError, BearerTokenValidator, JwtConfig, JwtTokenCodec, extract_bearer_token,
};
pub use config::{Settings, SettingsError};
pub use crypto::Argon2PasswordHasher;
pub use email::{MockEmailClient, PostmarkEmailClient, SentEmail};
pub use persistence::{
    HashMapCredentialStore, HashMapOneTimeTokenStore, HashMapSessionStore, HashMapUserStore,
    PostgresCredentialStore, PostgresOneTimeTokenStore, PostgresSessionStore, PostgresUserStore,
};
