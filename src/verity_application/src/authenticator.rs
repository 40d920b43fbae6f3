use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::Secret;
use thiserror::Error;
use url::Url;
use verity_core::{
    CredentialStore, Email, EmailClient, OneTimeTokenStore, PasswordHasher, RefreshToken,
    Session, SessionStore, TokenCodec, User, UserId, UserStore,
};

use crate::error::AuthError;
use crate::one_time_tokens::{IssuanceLocks, OneTimeTokenManager};
use crate::sessions::SessionIssuer;
use crate::use_cases::{
    initiate_email_verification::InitiateEmailVerificationUseCase,
    register_user::RegisterUserUseCase,
    set_password::{SetUserPasswordUseCase, UpdateUserPasswordUseCase},
    sign_in::{AuthenticatedUser, SignInRequest, SignInUseCase},
    validate_email_verification::ValidateEmailVerificationUseCase,
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

#[derive(Debug, Clone)]
pub struct AuthenticatorSettings {
    /// Public URL verification links are built from.
    pub base_url: Url,
    pub app_name: String,
    /// Audience used when the caller doesn't name one.
    pub default_audience: String,
    pub verification_token_ttl: Duration,
}

/// Entry point for every authentication flow.
///
/// Owns the ports and hands borrowed views of them to the individual use cases.
pub struct Authenticator {
    user_store: Arc<dyn UserStore>,
    token_store: Arc<dyn OneTimeTokenStore>,
    credential_store: Arc<dyn CredentialStore>,
    session_store: Arc<dyn SessionStore>,
    email_client: Arc<dyn EmailClient>,
    password_hasher: Arc<dyn PasswordHasher>,
    token_codec: Arc<dyn TokenCodec>,
    issuance_locks: IssuanceLocks,
    settings: AuthenticatorSettings,
}

impl Authenticator {
    pub fn builder(settings: AuthenticatorSettings) -> AuthenticatorBuilder {
        AuthenticatorBuilder::new(settings)
    }

    pub fn settings(&self) -> &AuthenticatorSettings {
        &self.settings
    }

    pub fn token_codec(&self) -> Arc<dyn TokenCodec> {
        self.token_codec.clone()
    }

    fn one_time_tokens(&self) -> OneTimeTokenManager<'_, dyn OneTimeTokenStore> {
        OneTimeTokenManager::new(self.token_store.as_ref(), &self.issuance_locks)
    }

    fn session_issuer(&self) -> SessionIssuer<'_, dyn SessionStore> {
        SessionIssuer::new(self.session_store.as_ref())
    }

    pub async fn register_user(
        &self,
        display_name: String,
        email: Secret<String>,
        password: Secret<String>,
    ) -> Result<User, AuthError> {
        RegisterUserUseCase::new(
            self.user_store.as_ref(),
            self.credential_store.as_ref(),
            self.password_hasher.as_ref(),
        )
        .execute(display_name, email, password, Utc::now())
        .await
    }

    pub async fn initiate_email_verification(
        &self,
        email: Secret<String>,
        redirect_to: Option<String>,
    ) -> Result<(), AuthError> {
        let email = Email::try_from(email)?;

        InitiateEmailVerificationUseCase::new(
            self.user_store.as_ref(),
            self.one_time_tokens(),
            self.email_client.as_ref(),
            &self.settings,
        )
        .execute(email, redirect_to, Utc::now())
        .await
    }

    /// Returns the redirect stored with the token, if any.
    pub async fn validate_email_verification(
        &self,
        token: Secret<String>,
    ) -> Result<Option<String>, AuthError> {
        ValidateEmailVerificationUseCase::new(self.user_store.as_ref(), self.one_time_tokens())
            .execute(token, Utc::now())
            .await
    }

    pub async fn sign_in_with_email(
        &self,
        request: SignInRequest,
    ) -> Result<AuthenticatedUser, AuthError> {
        SignInUseCase::new(
            self.user_store.as_ref(),
            self.credential_store.as_ref(),
            self.password_hasher.as_ref(),
            self.session_issuer(),
            self.token_codec.as_ref(),
            &self.settings.default_audience,
        )
        .execute(request, Utc::now())
        .await
    }

    pub async fn set_user_password(
        &self,
        user_id: UserId,
        password: Secret<String>,
    ) -> Result<(), AuthError> {
        SetUserPasswordUseCase::new(
            self.user_store.as_ref(),
            self.credential_store.as_ref(),
            self.password_hasher.as_ref(),
        )
        .execute(user_id, password, Utc::now())
        .await
    }

    pub async fn update_user_password(
        &self,
        user_id: UserId,
        password: Secret<String>,
    ) -> Result<(), AuthError> {
        UpdateUserPasswordUseCase::new(
            self.user_store.as_ref(),
            self.credential_store.as_ref(),
            self.password_hasher.as_ref(),
        )
        .execute(user_id, password, Utc::now())
        .await
    }

    pub async fn create_session(&self, session: Session) -> Result<Session, AuthError> {
        self.session_issuer()
            .create_session(session, Utc::now())
            .await
    }

    pub async fn create_refresh_token(
        &self,
        token: RefreshToken,
    ) -> Result<RefreshToken, AuthError> {
        self.session_issuer()
            .create_refresh_token(token, Utc::now())
            .await
    }
}

/// Collects the ports an [`Authenticator`] needs; `build` reports what's missing.
pub struct AuthenticatorBuilder {
    settings: AuthenticatorSettings,
    user_store: Option<Arc<dyn UserStore>>,
    token_store: Option<Arc<dyn OneTimeTokenStore>>,
    credential_store: Option<Arc<dyn CredentialStore>>,
    session_store: Option<Arc<dyn SessionStore>>,
    email_client: Option<Arc<dyn EmailClient>>,
    password_hasher: Option<Arc<dyn PasswordHasher>>,
    token_codec: Option<Arc<dyn TokenCodec>>,
}

impl AuthenticatorBuilder {
    pub fn new(settings: AuthenticatorSettings) -> Self {
        Self {
            settings,
            user_store: None,
            token_store: None,
            credential_store: None,
            session_store: None,
            email_client: None,
            password_hasher: None,
            token_codec: None,
        }
    }

    pub fn with_user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.user_store = Some(store);
        self
    }

    pub fn with_one_time_token_store(mut self, store: Arc<dyn OneTimeTokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn with_email_client(mut self, client: Arc<dyn EmailClient>) -> Self {
        self.email_client = Some(client);
        self
    }

    pub fn with_password_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.password_hasher = Some(hasher);
        self
    }

    pub fn with_token_codec(mut self, codec: Arc<dyn TokenCodec>) -> Self {
        self.token_codec = Some(codec);
        self
    }

    pub fn build(self) -> Result<Authenticator, ConfigurationError> {
        if self.settings.default_audience.trim().is_empty() {
            return Err(ConfigurationError::InvalidSetting(
                "default audience can't be empty".to_string(),
            ));
        }
        if self.settings.verification_token_ttl <= Duration::zero() {
            return Err(ConfigurationError::InvalidSetting(
                "verification token ttl must be positive".to_string(),
            ));
        }

        Ok(Authenticator {
            user_store: self
                .user_store
                .ok_or(ConfigurationError::MissingDependency("user store"))?,
            token_store: self
                .token_store
                .ok_or(ConfigurationError::MissingDependency("one-time token store"))?,
            credential_store: self
                .credential_store
                .ok_or(ConfigurationError::MissingDependency("credential store"))?,
            session_store: self
                .session_store
                .ok_or(ConfigurationError::MissingDependency("session store"))?,
            email_client: self
                .email_client
                .ok_or(ConfigurationError::MissingDependency("email client"))?,
            password_hasher: self
                .password_hasher
                .ok_or(ConfigurationError::MissingDependency("password hasher"))?,
            token_codec: self
                .token_codec
                .ok_or(ConfigurationError::MissingDependency("token codec"))?,
            issuance_locks: IssuanceLocks::new(),
            settings: self.settings,
        })
    }
}
