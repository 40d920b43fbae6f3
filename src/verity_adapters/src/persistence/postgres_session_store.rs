use sqlx::{PgExecutor, PgPool};
use verity_core::{RefreshToken, Session, SessionStore, SessionStoreError};

pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresSessionStore { pool }
    }
}

fn map_insert_error(e: sqlx::Error) -> SessionStoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return SessionStoreError::AlreadyExists;
        }
    }
    SessionStoreError::UnexpectedError(e.to_string())
}

async fn insert_session<'e>(
    executor: impl PgExecutor<'e>,
    session: &Session,
) -> Result<(), SessionStoreError> {
    sqlx::query(
        r#"
            INSERT INTO sessions
                (id, user_id, token_hash, user_agent, device_name, device_fingerprint, ip_address,
                 expires_at, created_at, refreshed_at, revoked_at, revoked_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(session.id.as_uuid())
    .bind(session.user_id.as_uuid())
    .bind(session.token_hash.as_str())
    .bind(session.client.user_agent.as_deref())
    .bind(session.client.device_name.as_deref())
    .bind(session.client.device_fingerprint.as_deref())
    .bind(session.client.ip_address.as_deref())
    .bind(session.expires_at)
    .bind(session.created_at)
    .bind(session.refreshed_at)
    .bind(session.revoked_at)
    .bind(session.revoked_by.as_ref().map(|id| *id.as_uuid()))
    .execute(executor)
    .await
    .map_err(map_insert_error)?;

    Ok(())
}

async fn insert_refresh_token<'e>(
    executor: impl PgExecutor<'e>,
    token: &RefreshToken,
) -> Result<(), SessionStoreError> {
    sqlx::query(
        r#"
            INSERT INTO refresh_tokens
                (id, user_id, session_id, token_hash, user_agent, device_name, device_fingerprint,
                 ip_address, expires_at, created_at, revoked_at, revoked_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(token.id)
    .bind(token.user_id.as_uuid())
    .bind(token.session_id.as_ref().map(|id| *id.as_uuid()))
    .bind(token.token_hash.as_str())
    .bind(token.client.user_agent.as_deref())
    .bind(token.client.device_name.as_deref())
    .bind(token.client.device_fingerprint.as_deref())
    .bind(token.client.ip_address.as_deref())
    .bind(token.expires_at)
    .bind(token.created_at)
    .bind(token.revoked_at)
    .bind(token.revoked_by.as_ref().map(|id| *id.as_uuid()))
    .execute(executor)
    .await
    .map_err(map_insert_error)?;

    Ok(())
}

#[async_trait::async_trait]
impl SessionStore for PostgresSessionStore {
    #[tracing::instrument(name = "Storing session in PostgreSQL", skip_all)]
    async fn create_session(&self, session: Session) -> Result<(), SessionStoreError> {
        insert_session(&self.pool, &session).await
    }

    #[tracing::instrument(name = "Storing refresh token in PostgreSQL", skip_all)]
    async fn create_refresh_token(&self, token: RefreshToken) -> Result<(), SessionStoreError> {
        insert_refresh_token(&self.pool, &token).await
    }

    #[tracing::instrument(name = "Storing session and refresh token in PostgreSQL", skip_all)]
    async fn create_session_with_refresh_token(
        &self,
        session: Session,
        token: RefreshToken,
    ) -> Result<(), SessionStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))?;

        insert_session(&mut *tx, &session).await?;
        insert_refresh_token(&mut *tx, &token).await?;

        tx.commit()
            .await
            .map_err(|e| SessionStoreError::UnexpectedError(e.to_string()))
    }
}
