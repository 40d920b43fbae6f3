//! In-memory doubles for the ports, shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;
use verity_core::{
    CredentialStore, CredentialStoreError, DisplayName, Email, EmailClient, EmailTemplate,
    HashedPassword, OneTimeToken, OneTimeTokenStore, OneTimeTokenStoreError, Password,
    PasswordHasher, PasswordHasherError, RESERVED_CLAIMS, RefreshToken, Session, SessionStore,
    SessionStoreError, TokenClaims, TokenCodec, TokenCodecError, TokenHash, TokenSubject,
    TokenType, User, UserId, UserPassword, UserStore, UserStoreError,
};

use crate::authenticator::{Authenticator, AuthenticatorSettings};

#[derive(Default)]
pub struct FakeUserStore {
    users: RwLock<HashMap<UserId, User>>,
    pub fail: AtomicBool,
}

impl FakeUserStore {
    pub async fn get(&self, id: &UserId) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    fn check(&self) -> Result<(), UserStoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(UserStoreError::UnexpectedError("user store down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FakeUserStore {
    async fn add_user(&self, user: User) -> Result<(), UserStoreError> {
        self.check()?;
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(UserStoreError::UserAlreadyExists);
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, UserStoreError> {
        self.check()?;
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn user_exists(&self, id: &UserId) -> Result<bool, UserStoreError> {
        self.check()?;
        Ok(self.users.read().await.contains_key(id))
    }

    async fn mark_email_verified(
        &self,
        id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        self.check()?;
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(UserStoreError::UserNotFound)?;
        user.email_verified_at = Some(verified_at);
        Ok(())
    }
}

/// Yields between reads and writes so unserialized issuance would interleave.
#[derive(Default)]
pub struct FakeTokenStore {
    tokens: RwLock<HashMap<Uuid, OneTimeToken>>,
    pub fail_delete: AtomicBool,
}

impl FakeTokenStore {
    pub async fn all(&self) -> Vec<OneTimeToken> {
        self.tokens.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl OneTimeTokenStore for FakeTokenStore {
    async fn find_pending(
        &self,
        user_id: &UserId,
        subject: TokenSubject,
    ) -> Result<Vec<OneTimeToken>, OneTimeTokenStoreError> {
        let pending = self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| t.user_id.as_ref() == Some(user_id) && t.subject == subject)
            .cloned()
            .collect();
        tokio::task::yield_now().await;
        Ok(pending)
    }

    async fn create_token(&self, token: OneTimeToken) -> Result<(), OneTimeTokenStoreError> {
        tokio::task::yield_now().await;
        self.tokens.write().await.insert(token.id, token);
        Ok(())
    }

    async fn touch_last_sent(
        &self,
        id: &Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), OneTimeTokenStoreError> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(id)
            .ok_or(OneTimeTokenStoreError::TokenNotFound)?;
        token.last_sent_at = Some(sent_at);
        Ok(())
    }

    async fn delete_token(&self, id: &Uuid) -> Result<(), OneTimeTokenStoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(OneTimeTokenStoreError::UnexpectedError(
                "delete failed".into(),
            ));
        }
        self.tokens
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(OneTimeTokenStoreError::TokenNotFound)
    }

    async fn get_token_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<OneTimeToken>, OneTimeTokenStoreError> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .find(|t| &t.token_hash == hash)
            .cloned())
    }
}

#[derive(Default)]
pub struct FakeCredentialStore {
    passwords: RwLock<HashMap<UserId, UserPassword>>,
}

impl FakeCredentialStore {
    pub async fn get(&self, user_id: &UserId) -> Option<UserPassword> {
        self.passwords.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn get_password(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserPassword>, CredentialStoreError> {
        Ok(self.get(user_id).await)
    }

    async fn create_password(&self, password: UserPassword) -> Result<(), CredentialStoreError> {
        let mut passwords = self.passwords.write().await;
        if passwords.contains_key(&password.user_id) {
            return Err(CredentialStoreError::PasswordAlreadySet);
        }
        passwords.insert(password.user_id, password);
        Ok(())
    }

    async fn upsert_password(&self, password: UserPassword) -> Result<(), CredentialStoreError> {
        self.passwords
            .write()
            .await
            .insert(password.user_id, password);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSessionStore {
    sessions: RwLock<Vec<Session>>,
    refresh_tokens: RwLock<Vec<RefreshToken>>,
    pub fail_refresh_tokens: AtomicBool,
}

impl FakeSessionStore {
    pub async fn sessions(&self) -> Vec<Session> {
        self.sessions.read().await.clone()
    }

    pub async fn refresh_tokens(&self) -> Vec<RefreshToken> {
        self.refresh_tokens.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for FakeSessionStore {
    async fn create_session(&self, session: Session) -> Result<(), SessionStoreError> {
        self.sessions.write().await.push(session);
        Ok(())
    }

    async fn create_refresh_token(&self, token: RefreshToken) -> Result<(), SessionStoreError> {
        if self.fail_refresh_tokens.load(Ordering::SeqCst) {
            return Err(SessionStoreError::UnexpectedError("insert failed".into()));
        }
        self.refresh_tokens.write().await.push(token);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipients: Vec<Email>,
    pub subject: String,
    pub template: EmailTemplate,
}

#[derive(Default)]
pub struct RecordingEmailClient {
    sent: RwLock<Vec<SentEmail>>,
    pub fail: AtomicBool,
}

impl RecordingEmailClient {
    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl EmailClient for RecordingEmailClient {
    async fn send_email(
        &self,
        recipients: &[Email],
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("smtp unavailable".to_string());
        }
        self.sent.write().await.push(SentEmail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            template: template.clone(),
        });
        Ok(())
    }
}

/// Reversible "hash" so tests stay fast.
pub struct PlainPasswordHasher;

const PLAIN_PREFIX: &str = "plain$";

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, password: &Password) -> Result<HashedPassword, PasswordHasherError> {
        Ok(HashedPassword::new(Secret::from(format!(
            "{PLAIN_PREFIX}{}",
            password.as_ref().expose_secret()
        ))))
    }

    async fn validate(
        &self,
        password: &Password,
        hash: &HashedPassword,
    ) -> Result<bool, PasswordHasherError> {
        let stored = hash
            .as_ref()
            .expose_secret()
            .strip_prefix(PLAIN_PREFIX)
            .ok_or_else(|| PasswordHasherError::MalformedHash("missing prefix".into()))?;
        Ok(stored == password.as_ref().expose_secret())
    }
}

/// Delegates to [`PlainPasswordHasher`], counting calls and failing on demand.
#[derive(Default)]
pub struct CountingPasswordHasher {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingPasswordHasher {
    fn record(&self) -> Result<(), PasswordHasherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PasswordHasherError::HashingFailed("worker panicked".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PasswordHasher for CountingPasswordHasher {
    async fn hash(&self, password: &Password) -> Result<HashedPassword, PasswordHasherError> {
        self.record()?;
        PlainPasswordHasher.hash(password).await
    }

    async fn validate(
        &self,
        password: &Password,
        hash: &HashedPassword,
    ) -> Result<bool, PasswordHasherError> {
        self.record()?;
        PlainPasswordHasher.validate(password, hash).await
    }
}

/// Unsigned JSON "tokens" carrying the same claim layout as real ones.
#[derive(Default)]
pub struct FakeTokenCodec {
    pub fail_signing: AtomicBool,
}

impl FakeTokenCodec {
    fn encode(&self, claims: TokenClaims) -> Result<String, TokenCodecError> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(TokenCodecError::MissingSecret);
        }
        serde_json::to_string(&claims).map_err(|e| TokenCodecError::Signing(e.to_string()))
    }
}

impl TokenCodec for FakeTokenCodec {
    fn sign_access(
        &self,
        mut payload: Map<String, Value>,
        subject: &str,
    ) -> Result<String, TokenCodecError> {
        let now = Utc::now();
        for key in RESERVED_CLAIMS {
            payload.remove(key);
        }
        let aud = payload
            .remove("aud")
            .and_then(|v| v.as_str().map(str::to_string));
        self.encode(TokenClaims {
            iss: "test".to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_token_ttl()).timestamp(),
            typ: TokenType::Access,
            sub: Some(subject.to_string()),
            aud,
            jti: None,
            extra: payload,
        })
    }

    fn sign_refresh(
        &self,
        user_id: &UserId,
        audience: &str,
        token_id: &Uuid,
    ) -> Result<String, TokenCodecError> {
        let now = Utc::now();
        self.encode(TokenClaims {
            iss: "test".to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_token_ttl()).timestamp(),
            typ: TokenType::Refresh,
            sub: Some(user_id.to_string()),
            aud: Some(audience.to_string()),
            jti: Some(token_id.to_string()),
            extra: Map::new(),
        })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenCodecError> {
        let claims: TokenClaims =
            serde_json::from_str(token).map_err(|_| TokenCodecError::Unauthorized)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenCodecError::Unauthorized);
        }
        Ok(claims)
    }

    fn access_token_ttl(&self) -> Duration {
        Duration::hours(24)
    }

    fn refresh_token_ttl(&self) -> Duration {
        Duration::days(7)
    }
}

pub fn email(raw: &str) -> Email {
    Email::try_from(Secret::from(raw.to_string())).expect("test email is valid")
}

pub fn new_user(raw_email: &str) -> User {
    let name = DisplayName::try_from("Test User Name".to_string()).expect("valid display name");
    User::new(name, email(raw_email), Utc::now())
}

pub fn settings() -> AuthenticatorSettings {
    AuthenticatorSettings {
        base_url: Url::parse("https://auth.example.com/").expect("valid base url"),
        app_name: "Verity".to_string(),
        default_audience: "client-app".to_string(),
        verification_token_ttl: Duration::minutes(15),
    }
}

/// Every fake wired into an [`Authenticator`], kept reachable for assertions.
pub struct Harness {
    pub users: Arc<FakeUserStore>,
    pub tokens: Arc<FakeTokenStore>,
    pub credentials: Arc<FakeCredentialStore>,
    pub sessions: Arc<FakeSessionStore>,
    pub emails: Arc<RecordingEmailClient>,
    pub codec: Arc<FakeTokenCodec>,
    pub authenticator: Authenticator,
}

impl Harness {
    pub fn new() -> Self {
        let users = Arc::new(FakeUserStore::default());
        let tokens = Arc::new(FakeTokenStore::default());
        let credentials = Arc::new(FakeCredentialStore::default());
        let sessions = Arc::new(FakeSessionStore::default());
        let emails = Arc::new(RecordingEmailClient::default());
        let codec = Arc::new(FakeTokenCodec::default());

        let authenticator = Authenticator::builder(settings())
            .with_user_store(users.clone())
            .with_one_time_token_store(tokens.clone())
            .with_credential_store(credentials.clone())
            .with_session_store(sessions.clone())
            .with_email_client(emails.clone())
            .with_password_hasher(Arc::new(PlainPasswordHasher))
            .with_token_codec(codec.clone())
            .build()
            .expect("all dependencies provided");

        Self {
            users,
            tokens,
            credentials,
            sessions,
            emails,
            codec,
            authenticator,
        }
    }

    /// Adds a user with `password`, verified or not.
    pub async fn seed_user(&self, raw_email: &str, password: &str, verified: bool) -> User {
        let mut user = new_user(raw_email);
        if verified {
            user.email_verified_at = Some(Utc::now());
        }
        self.users.add_user(user.clone()).await.expect("fresh user");

        let password = Password::try_from(Secret::from(password.to_string()))
            .expect("test password is valid");
        let hash = PlainPasswordHasher.hash(&password).await.expect("hashes");
        self.credentials
            .create_password(UserPassword {
                user_id: user.id,
                password_hash: hash,
                created_at: Utc::now(),
                updated_at: None,
            })
            .await
            .expect("fresh password");

        user
    }
}
