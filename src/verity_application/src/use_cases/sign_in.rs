use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value};
use uuid::Uuid;
use verity_core::{
    ClientMetadata, CredentialStore, EMAIL_CLAIM, Email, Password, PasswordHasher,
    PasswordHasherError, RefreshToken,
    SESSION_ID_CLAIM, Session, SessionId, SessionStore, TokenCodec, USER_ID_CLAIM, User, UserId,
    UserStore, hash_token,
};

use crate::error::AuthError;
use crate::sessions::SessionIssuer;

/// Raw sign-in input as received from the transport layer.
#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub email: Secret<String>,
    pub password: Secret<String>,
    /// Client identifier; the configured default applies when absent.
    pub audience: Option<String>,
    pub client: ClientMetadata,
}

/// Token bundle handed back after a successful sign-in.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
    pub session_id: SessionId,
    pub token_expiry: DateTime<Utc>,
}

/// Sign-in with email and password.
pub struct SignInUseCase<'a, U, C, H, S, K>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
    S: SessionStore + ?Sized,
    K: TokenCodec + ?Sized,
{
    user_store: &'a U,
    credential_store: &'a C,
    hasher: &'a H,
    sessions: SessionIssuer<'a, S>,
    codec: &'a K,
    default_audience: &'a str,
}

impl<'a, U, C, H, S, K> SignInUseCase<'a, U, C, H, S, K>
where
    U: UserStore + ?Sized,
    C: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
    S: SessionStore + ?Sized,
    K: TokenCodec + ?Sized,
{
    pub fn new(
        user_store: &'a U,
        credential_store: &'a C,
        hasher: &'a H,
        sessions: SessionIssuer<'a, S>,
        codec: &'a K,
        default_audience: &'a str,
    ) -> Self {
        Self {
            user_store,
            credential_store,
            hasher,
            sessions,
            codec,
            default_audience,
        }
    }

    /// Unknown email, wrong password and unverified email all fail with
    /// `InvalidCredentials`. Once the credentials are proven, any failure is
    /// `Internal`.
    #[tracing::instrument(name = "SignInUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        request: SignInRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedUser, AuthError> {
        let SignInRequest {
            email,
            password,
            audience,
            client,
        } = request;

        if email.expose_secret().trim().is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = Email::try_from(email)?;
        let password = Password::try_from(password)?;

        let Some(user) = self.user_store.get_user_by_email(&email).await? else {
            self.spend_hashing_time(&password).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.password_matches(&user.id, &password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_email_verified() {
            tracing::debug!(user_id = %user.id, "sign-in refused for unverified email");
            return Err(AuthError::InvalidCredentials);
        }

        let audience = audience
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.default_audience.to_string());

        let authenticated = self
            .issue_tokens(user, &audience, client, now)
            .await
            .map_err(AuthError::into_internal)?;

        tracing::info!(
            user_id = %authenticated.user.id,
            session_id = %authenticated.session_id,
            "user signed in"
        );
        Ok(authenticated)
    }

    async fn password_matches(
        &self,
        user_id: &UserId,
        password: &Password,
    ) -> Result<bool, AuthError> {
        let Some(stored) = self.credential_store.get_password(user_id).await? else {
            self.spend_hashing_time(password).await;
            return Ok(false);
        };

        match self.hasher.validate(password, &stored.password_hash).await {
            Ok(matches) => Ok(matches),
            Err(PasswordHasherError::MalformedHash(e)) => {
                tracing::warn!(%user_id, error = %e, "stored password hash is unusable");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hashes the candidate anyway when there is nothing to compare it with,
    /// so a missing account costs as much as a wrong password.
    async fn spend_hashing_time(&self, password: &Password) {
        if let Err(e) = self.hasher.hash(password).await {
            tracing::debug!(error = %e, "hashing for a missing account failed");
        }
    }

    async fn issue_tokens(
        &self,
        user: User,
        audience: &str,
        client: ClientMetadata,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedUser, AuthError> {
        let refresh_token_id = Uuid::now_v7();
        let refresh_jwt = self
            .codec
            .sign_refresh(&user.id, audience, &refresh_token_id)?;
        let refresh_hash = hash_token(&refresh_jwt);

        let session = Session::new(
            user.id,
            refresh_hash.clone(),
            client.clone(),
            now,
            now + self.codec.access_token_ttl(),
        );

        let mut payload = Map::new();
        payload.insert(USER_ID_CLAIM.to_string(), Value::String(user.id.to_string()));
        payload.insert(
            EMAIL_CLAIM.to_string(),
            Value::String(user.email.as_ref().expose_secret().clone()),
        );
        payload.insert(
            SESSION_ID_CLAIM.to_string(),
            Value::String(session.id.to_string()),
        );
        payload.insert("aud".to_string(), Value::String(audience.to_string()));
        let access_jwt = self.codec.sign_access(payload, &user.id.to_string())?;

        let refresh_token = RefreshToken {
            id: refresh_token_id,
            user_id: user.id,
            session_id: Some(session.id),
            token_hash: refresh_hash,
            client,
            expires_at: now + self.codec.refresh_token_ttl(),
            created_at: now,
            revoked_at: None,
            revoked_by: None,
        };

        let (session, _) = self.sessions.issue(session, refresh_token, now).await?;

        Ok(AuthenticatedUser {
            user,
            access_token: Secret::from(access_jwt),
            refresh_token: Secret::from(refresh_jwt),
            session_id: session.id,
            token_expiry: session.expires_at,
        })
    }
}
