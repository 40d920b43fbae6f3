use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use url::Url;
use verity_core::{
    Email, EmailClient, EmailTemplate, OneTimeSecret, OneTimeTokenStore,
    REDIRECT_TO_METADATA_KEY, TokenSubject, UserStore,
};

use crate::authenticator::AuthenticatorSettings;
use crate::error::AuthError;
use crate::one_time_tokens::OneTimeTokenManager;

/// Path (relative to the public base URL) the verification link points at.
pub const VERIFY_EMAIL_PATH: &str = "api/v1/auth/verify-email";
pub const VERIFICATION_EMAIL_SUBJECT: &str = "Verify your email address";

/// Sends a fresh email-verification link to an unverified user.
pub struct InitiateEmailVerificationUseCase<'a, U, T, E>
where
    U: UserStore + ?Sized,
    T: OneTimeTokenStore + ?Sized,
    E: EmailClient + ?Sized,
{
    user_store: &'a U,
    tokens: OneTimeTokenManager<'a, T>,
    email_client: &'a E,
    settings: &'a AuthenticatorSettings,
}

impl<'a, U, T, E> InitiateEmailVerificationUseCase<'a, U, T, E>
where
    U: UserStore + ?Sized,
    T: OneTimeTokenStore + ?Sized,
    E: EmailClient + ?Sized,
{
    pub fn new(
        user_store: &'a U,
        tokens: OneTimeTokenManager<'a, T>,
        email_client: &'a E,
        settings: &'a AuthenticatorSettings,
    ) -> Self {
        Self {
            user_store,
            tokens,
            email_client,
            settings,
        }
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown email, `InvalidInput` when the email is already
    /// verified or `redirect_to` isn't an absolute http(s) URL, `Internal` when
    /// the mail can't be sent.
    #[tracing::instrument(name = "InitiateEmailVerificationUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        email: Email,
        redirect_to: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let user = self
            .user_store
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound("user"))?;

        if user.is_email_verified() {
            return Err(AuthError::InvalidInput(
                "email is already verified".to_string(),
            ));
        }

        let mut metadata = Map::new();
        if let Some(redirect_to) = redirect_to.filter(|r| !r.trim().is_empty()) {
            metadata.insert(
                REDIRECT_TO_METADATA_KEY.to_string(),
                Value::String(parse_redirect(&redirect_to)?.into()),
            );
        }

        let issued = self
            .tokens
            .issue(
                Some(user.id),
                TokenSubject::EmailVerification,
                user.email.as_ref().expose_secret().clone(),
                metadata,
                self.settings.verification_token_ttl,
                now,
            )
            .await?;

        let template = EmailTemplate::EmailVerification {
            display_name: user.display_name.clone(),
            verify_url: self.verification_url(&issued.secret)?.into(),
            app_name: self.settings.app_name.clone(),
        };

        self.email_client
            .send_email(
                std::slice::from_ref(&user.email),
                VERIFICATION_EMAIL_SUBJECT,
                &template,
            )
            .await
            .map_err(AuthError::internal)?;

        if let Err(e) = self.tokens.mark_sent(&issued.token.id, now).await {
            tracing::warn!(error = %e, "failed to record verification email delivery");
        }

        tracing::info!(user_id = %user.id, "verification email sent");
        Ok(())
    }

    /// Link carrying only the raw secret.
    fn verification_url(&self, secret: &OneTimeSecret) -> Result<Url, AuthError> {
        let mut url = self
            .settings
            .base_url
            .join(VERIFY_EMAIL_PATH)
            .map_err(AuthError::internal)?;
        url.query_pairs_mut()
            .append_pair("token", secret.as_ref().expose_secret());
        Ok(url)
    }
}

fn parse_redirect(raw: &str) -> Result<Url, AuthError> {
    let invalid = || AuthError::InvalidInput("redirect_to must be an absolute http(s) URL".into());
    let url = Url::parse(raw).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}
