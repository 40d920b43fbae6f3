use chrono::{DateTime, Utc};
use secrecy::Secret;
use verity_core::{
    CredentialStore, DisplayName, Email, Password, PasswordHasher, User, UserStore,
};

use super::set_password::SetUserPasswordUseCase;
use crate::error::AuthError;

/// Registration: creates an unverified user and stores their password.
pub struct RegisterUserUseCase<'a, U, C, H>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    user_store: &'a U,
    credential_store: &'a C,
    hasher: &'a H,
}

impl<'a, U, C, H> RegisterUserUseCase<'a, U, C, H>
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

    #[tracing::instrument(name = "RegisterUserUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        display_name: String,
        email: Secret<String>,
        password: Secret<String>,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let display_name = DisplayName::try_from(display_name)?;
        let email = Email::try_from(email)?;
        // Validate before the user row exists.
        Password::try_from(password.clone())?;

        let user = User::new(display_name, email, now);
        self.user_store.add_user(user.clone()).await?;

        SetUserPasswordUseCase::new(self.user_store, self.credential_store, self.hasher)
            .execute(user.id, password, now)
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }
}
