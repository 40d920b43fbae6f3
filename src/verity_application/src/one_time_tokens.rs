use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use verity_core::{
    OneTimeSecret, OneTimeToken, OneTimeTokenStore, OneTimeTokenStoreError, TokenSubject, UserId,
};

use crate::error::AuthError;

/// Per-(user, subject) async locks serializing token issuance within this process.
#[derive(Debug, Default)]
pub struct IssuanceLocks(DashMap<(UserId, TokenSubject), Arc<Mutex<()>>>);

impl IssuanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive issuance rights on `key`.
    ///
    /// The map entry is released when the permit drops, including when the
    /// caller is cancelled while still waiting.
    async fn acquire(&self, key: (UserId, TokenSubject)) -> IssuancePermit<'_> {
        let mut permit = IssuancePermit {
            locks: self,
            key,
            guard: None,
        };
        let lock = self.0.entry(key).or_default().clone();
        permit.guard = Some(lock.lock_owned().await);
        permit
    }

    /// Drops the entry once nobody but the map holds it.
    fn release(&self, key: &(UserId, TokenSubject)) {
        self.0.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

struct IssuancePermit<'a> {
    locks: &'a IssuanceLocks,
    key: (UserId, TokenSubject),
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IssuancePermit<'_> {
    fn drop(&mut self) {
        // The guard holds a reference to the lock; let go of it before pruning.
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}

/// A freshly minted token: the raw secret for delivery and the stored record.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub secret: OneTimeSecret,
    pub token: OneTimeToken,
}

/// Issues, resolves and retires single-use tokens.
pub struct OneTimeTokenManager<'a, T>
where
    T: OneTimeTokenStore + ?Sized,
{
    store: &'a T,
    locks: &'a IssuanceLocks,
}

impl<'a, T> OneTimeTokenManager<'a, T>
where
    T: OneTimeTokenStore + ?Sized,
{
    pub fn new(store: &'a T, locks: &'a IssuanceLocks) -> Self {
        Self { store, locks }
    }

    /// Mints a new token, retiring every earlier token for the same (user, subject).
    ///
    /// Only the hash of the secret is stored.
    #[tracing::instrument(name = "OneTimeTokenManager::issue", skip(self, relates_to, metadata))]
    pub async fn issue(
        &self,
        user_id: Option<UserId>,
        subject: TokenSubject,
        relates_to: String,
        metadata: Map<String, Value>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let secret = OneTimeSecret::generate();
        let token = OneTimeToken::new(
            user_id,
            subject,
            secret.hash(),
            relates_to,
            metadata,
            now,
            ttl,
        );

        match user_id {
            Some(user_id) => {
                let _permit = self.locks.acquire((user_id, subject)).await;
                self.rotate(&user_id, token.clone()).await?;
            }
            None => self.store.create_token(token.clone()).await?,
        }

        Ok(IssuedToken { secret, token })
    }

    async fn rotate(&self, user_id: &UserId, token: OneTimeToken) -> Result<(), AuthError> {
        let previous = self.store.find_pending(user_id, token.subject).await?;

        for stale in previous {
            match self.store.delete_token(&stale.id).await {
                Ok(()) | Err(OneTimeTokenStoreError::TokenNotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.store.create_token(token).await?;
        Ok(())
    }

    /// Looks a token up by its raw secret. Absence is `None`, not an error.
    pub async fn resolve(
        &self,
        secret: &OneTimeSecret,
    ) -> Result<Option<OneTimeToken>, AuthError> {
        Ok(self.store.get_token_by_hash(&secret.hash()).await?)
    }

    /// Resolves `secret` and checks it is usable for `subject` at `now`.
    ///
    /// Unknown, expired, mismatched and ownerless tokens all fail the same way.
    #[tracing::instrument(name = "OneTimeTokenManager::validate", skip(self, secret))]
    pub async fn validate(
        &self,
        secret: &OneTimeSecret,
        subject: TokenSubject,
        now: DateTime<Utc>,
    ) -> Result<OneTimeToken, AuthError> {
        let token = self.resolve(secret).await?.ok_or(AuthError::Unauthorized)?;

        if token.subject != subject {
            tracing::debug!("token subject mismatch");
            return Err(AuthError::Unauthorized);
        }

        if !token.is_valid_at(now) {
            tracing::debug!(expires_at = %token.expires_at, "token expired");
            return Err(AuthError::Unauthorized);
        }

        if token.user_id.is_none() {
            tracing::debug!("token has no owning user");
            return Err(AuthError::Unauthorized);
        }

        Ok(token)
    }

    pub async fn invalidate(&self, token_id: &Uuid) -> Result<(), AuthError> {
        Ok(self.store.delete_token(token_id).await?)
    }

    pub async fn mark_sent(&self, token_id: &Uuid, sent_at: DateTime<Utc>) -> Result<(), AuthError> {
        Ok(self.store.touch_last_sent(token_id, sent_at).await?)
    }
}
