use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{self, PasswordHasher as _, SaltString, rand_core},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use verity_core::{HashedPassword, Password, PasswordHasher, PasswordHasherError};

pub const DEFAULT_MEMORY_COST_KIB: u32 = 15000;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id in PHC string format; the salt and parameters travel with the hash.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(
        memory_cost_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordHasherError> {
        let params = Params::new(memory_cost_kib, iterations, parallelism, None)
            .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))?;
        Ok(Self { params })
    }

    pub fn with_default_params() -> Result<Self, PasswordHasherError> {
        Self::new(DEFAULT_MEMORY_COST_KIB, DEFAULT_ITERATIONS, DEFAULT_PARALLELISM)
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    #[tracing::instrument(name = "Computing password hash", skip_all)]
    async fn hash(&self, password: &Password) -> Result<HashedPassword, PasswordHasherError> {
        let current_span: tracing::Span = tracing::Span::current();
        let params = self.params.clone();
        let password = password.clone();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(move || {
                let salt = SaltString::generate(rand_core::OsRng);
                Self::argon2(params)
                    .hash_password(password.as_ref().expose_secret().as_bytes(), &salt)
                    .map(|hash| HashedPassword::new(Secret::from(hash.to_string())))
                    .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))
            })
        })
        .await
        .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))?
    }

    #[tracing::instrument(name = "Verify password hash", skip_all)]
    async fn validate(
        &self,
        password: &Password,
        hash: &HashedPassword,
    ) -> Result<bool, PasswordHasherError> {
        let current_span: tracing::Span = tracing::Span::current();
        let params = self.params.clone();
        let password = password.clone();
        let hash = hash.clone();

        tokio::task::spawn_blocking(move || {
            current_span.in_scope(move || {
                let expected = PasswordHash::new(hash.as_ref().expose_secret())
                    .map_err(|e| PasswordHasherError::MalformedHash(e.to_string()))?;

                match Self::argon2(params)
                    .verify_password(password.as_ref().expose_secret().as_bytes(), &expected)
                {
                    Ok(()) => Ok(true),
                    Err(password_hash::Error::Password) => Ok(false),
                    Err(e) => Err(PasswordHasherError::MalformedHash(e.to_string())),
                }
            })
        })
        .await
        .map_err(|e| PasswordHasherError::HashingFailed(e.to_string()))?
    }
}
