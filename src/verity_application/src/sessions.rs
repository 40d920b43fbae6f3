use chrono::{DateTime, Utc};
use verity_core::{RefreshToken, Session, SessionStore, TokenHash, UserId};

use crate::error::AuthError;

/// Validates and persists sessions and their refresh tokens.
pub struct SessionIssuer<'a, S>
where
    S: SessionStore + ?Sized,
{
    store: &'a S,
}

impl<'a, S> SessionIssuer<'a, S>
where
    S: SessionStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "SessionIssuer::create_session", skip_all)]
    pub async fn create_session(
        &self,
        session: Session,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        ensure_issuable("session", &session.user_id, &session.token_hash, session.expires_at, now)?;
        self.store.create_session(session.clone()).await?;
        Ok(session)
    }

    #[tracing::instrument(name = "SessionIssuer::create_refresh_token", skip_all)]
    pub async fn create_refresh_token(
        &self,
        token: RefreshToken,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, AuthError> {
        ensure_issuable("refresh token", &token.user_id, &token.token_hash, token.expires_at, now)?;
        self.store.create_refresh_token(token.clone()).await?;
        Ok(token)
    }

    /// Validates both records, then persists them as a pair.
    #[tracing::instrument(name = "SessionIssuer::issue", skip_all)]
    pub async fn issue(
        &self,
        session: Session,
        token: RefreshToken,
        now: DateTime<Utc>,
    ) -> Result<(Session, RefreshToken), AuthError> {
        ensure_issuable("session", &session.user_id, &session.token_hash, session.expires_at, now)?;
        ensure_issuable("refresh token", &token.user_id, &token.token_hash, token.expires_at, now)?;

        if token.session_id != Some(session.id) {
            return Err(AuthError::InvalidInput(
                "refresh token must belong to the session it is issued with".to_string(),
            ));
        }

        self.store
            .create_session_with_refresh_token(session.clone(), token.clone())
            .await?;

        Ok((session, token))
    }
}

fn ensure_issuable(
    record: &str,
    user_id: &UserId,
    token_hash: &TokenHash,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    if user_id.as_uuid().is_nil() {
        return Err(AuthError::InvalidInput(format!("{record} requires a user")));
    }
    if token_hash.is_empty() {
        return Err(AuthError::InvalidInput(format!("{record} requires a token hash")));
    }
    if expires_at <= now {
        return Err(AuthError::InvalidInput(format!(
            "{record} must expire in the future"
        )));
    }
    Ok(())
}
