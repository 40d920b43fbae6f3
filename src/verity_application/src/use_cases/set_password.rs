use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use verity_core::{
    CredentialStore, HashedPassword, Password, PasswordHasher, UserId, UserPassword, UserStore,
};

use crate::error::AuthError;

/// Checks the incoming password and the target user, then hashes the password.
async fn hash_for_existing_user<U, H>(
    user_store: &U,
    hasher: &H,
    user_id: &UserId,
    password: Secret<String>,
) -> Result<HashedPassword, AuthError>
where
    U: UserStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    if password.expose_secret().is_empty() {
        return Err(AuthError::InvalidInput("password is required".to_string()));
    }
    let password = Password::try_from(password)?;

    if !user_store.user_exists(user_id).await? {
        return Err(AuthError::NotFound("user"));
    }

    Ok(hasher.hash(&password).await?)
}

/// Stores the first password of a user.
pub struct SetUserPasswordUseCase<'a, U, C, H>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    user_store: &'a U,
    credential_store: &'a C,
    hasher: &'a H,
}

impl<'a, U, C, H> SetUserPasswordUseCase<'a, U, C, H>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    pub fn new(user_store: &'a U, credential_store: &'a C, hasher: &'a H) -> Self {
        Self {
            user_store,
            credential_store,
            hasher,
        }
    }

    /// Fails with `Conflict` when the user already has a password.
    #[tracing::instrument(name = "SetUserPasswordUseCase::execute", skip(self, password))]
    pub async fn execute(
        &self,
        user_id: UserId,
        password: Secret<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let password_hash =
            hash_for_existing_user(self.user_store, self.hasher, &user_id, password).await?;

        self.credential_store
            .create_password(UserPassword {
                user_id,
                password_hash,
                created_at: now,
                updated_at: None,
            })
            .await?;

        Ok(())
    }
}

/// Replaces the password of an existing user.
pub struct UpdateUserPasswordUseCase<'a, U, C, H>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    user_store: &'a U,
    credential_store: &'a C,
    hasher: &'a H,
}

impl<'a, U, C, H> UpdateUserPasswordUseCase<'a, U, C, H>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    pub fn new(user_store: &'a U, credential_store: &'a C, hasher: &'a H) -> Self {
        Self {
            user_store,
            credential_store,
            hasher,
        }
    }

    #[tracing::instrument(name = "UpdateUserPasswordUseCase::execute", skip(self, password))]
    pub async fn execute(
        &self,
        user_id: UserId,
        password: Secret<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let password_hash =
            hash_for_existing_user(self.user_store, self.hasher, &user_id, password).await?;

        self.credential_store
            .upsert_password(UserPassword {
                user_id,
                password_hash,
                created_at: now,
                updated_at: Some(now),
            })
            .await?;

        Ok(())
    }
}
