use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use verity_core::{
    OneTimeToken, OneTimeTokenStore, OneTimeTokenStoreError, TokenHash, TokenSubject, UserId,
};

/// Enforces the same uniqueness rules as the `one_time_tokens` table: one token
/// per (user, subject) and unique hashes.
#[derive(Default, Clone)]
pub struct HashMapOneTimeTokenStore {
    tokens: Arc<RwLock<HashMap<Uuid, OneTimeToken>>>,
}

impl HashMapOneTimeTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl OneTimeTokenStore for HashMapOneTimeTokenStore {
    async fn find_pending(
        &self,
        user_id: &UserId,
        subject: TokenSubject,
    ) -> Result<Vec<OneTimeToken>, OneTimeTokenStoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|token| token.user_id.as_ref() == Some(user_id) && token.subject == subject)
            .cloned()
            .collect())
    }

    async fn create_token(&self, token: OneTimeToken) -> Result<(), OneTimeTokenStoreError> {
        let mut tokens = self.tokens.write().await;

        let clashes = tokens.values().any(|existing| {
            existing.token_hash == token.token_hash
                || (token.user_id.is_some()
                    && existing.user_id == token.user_id
                    && existing.subject == token.subject)
        });
        if clashes {
            return Err(OneTimeTokenStoreError::AlreadyPending);
        }

        tokens.insert(token.id, token);
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
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .find(|token| &token.token_hash == hash)
            .cloned())
    }
}
