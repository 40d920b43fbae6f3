use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;
use verity_core::{RefreshToken, Session, SessionId, SessionStore, SessionStoreError};

#[derive(Default)]
struct Records {
    sessions: HashMap<SessionId, Session>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
}

/// Sessions and refresh tokens share one lock so a pair is stored atomically.
#[derive(Default, Clone)]
pub struct HashMapSessionStore {
    records: Arc<RwLock<Records>>,
}

impl HashMapSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_session(&self, id: &SessionId) -> Option<Session> {
        self.records.read().await.sessions.get(id).cloned()
    }

    pub async fn get_refresh_token(&self, id: &Uuid) -> Option<RefreshToken> {
        self.records.read().await.refresh_tokens.get(id).cloned()
    }
}

fn insert_session(records: &mut Records, session: Session) -> Result<(), SessionStoreError> {
    if records.sessions.contains_key(&session.id) {
        return Err(SessionStoreError::AlreadyExists);
    }
    records.sessions.insert(session.id, session);
    Ok(())
}

fn insert_refresh_token(
    records: &mut Records,
    token: RefreshToken,
) -> Result<(), SessionStoreError> {
    let duplicate = records.refresh_tokens.contains_key(&token.id)
        || records
            .refresh_tokens
            .values()
            .any(|existing| existing.token_hash == token.token_hash);
    if duplicate {
        return Err(SessionStoreError::AlreadyExists);
    }
    records.refresh_tokens.insert(token.id, token);
    Ok(())
}

#[async_trait::async_trait]
impl SessionStore for HashMapSessionStore {
    async fn create_session(&self, session: Session) -> Result<(), SessionStoreError> {
        insert_session(&mut *self.records.write().await, session)
    }

    async fn create_refresh_token(&self, token: RefreshToken) -> Result<(), SessionStoreError> {
        insert_refresh_token(&mut *self.records.write().await, token)
    }

    async fn create_session_with_refresh_token(
        &self,
        session: Session,
        token: RefreshToken,
    ) -> Result<(), SessionStoreError> {
        let mut records = self.records.write().await;
        let session_id = session.id;

        insert_session(&mut records, session)?;
        if let Err(e) = insert_refresh_token(&mut records, token) {
            records.sessions.remove(&session_id);
            return Err(e);
        }
        Ok(())
    }
}
