use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use verity_core::{OneTimeSecret, OneTimeTokenStore, TokenSubject, UserStore};

use crate::error::AuthError;
use crate::one_time_tokens::OneTimeTokenManager;

/// Redeems an email-verification secret.
pub struct ValidateEmailVerificationUseCase<'a, U, T>
where
    U: UserStore + ?Sized,
    T: OneTimeTokenStore + ?Sized,
{
    user_store: &'a U,
    tokens: OneTimeTokenManager<'a, T>,
}

impl<'a, U, T> ValidateEmailVerificationUseCase<'a, U, T>
where
    U: UserStore + ?Sized,
    T: OneTimeTokenStore + ?Sized,
{
    pub fn new(user_store: &'a U, tokens: OneTimeTokenManager<'a, T>) -> Self {
        Self { user_store, tokens }
    }

    /// Marks the owner's email verified and consumes the token.
    ///
    /// Returns the redirect stored when the token was issued, if any.
    #[tracing::instrument(name = "ValidateEmailVerificationUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        raw_token: Secret<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AuthError> {
        if raw_token.expose_secret().trim().is_empty() {
            return Err(AuthError::Unauthorized);
        }
        let secret = OneTimeSecret::from(raw_token);

        let token = self
            .tokens
            .validate(&secret, TokenSubject::EmailVerification, now)
            .await?;
        let user_id = token.user_id.ok_or(AuthError::Unauthorized)?;

        self.user_store.mark_email_verified(&user_id, now).await?;

        if let Err(e) = self.tokens.invalidate(&token.id).await {
            tracing::warn!(token_id = %token.id, error = %e, "failed to invalidate consumed token");
        }

        tracing::info!(%user_id, "email verified");
        Ok(token.redirect_to().map(str::to_string))
    }
}
