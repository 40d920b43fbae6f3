use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;
use verity_core::{
    OneTimeToken, OneTimeTokenStore, OneTimeTokenStoreError, TokenHash, TokenSubject, UserId,
};

/// Partial unique index allowing one outstanding token per (user, subject).
pub const USER_SUBJECT_CONSTRAINT: &str = "one_time_tokens_user_subject_key";

fn map_create_error(e: sqlx::Error) -> OneTimeTokenStoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && is_pending_conflict(db_err.constraint()) {
            return OneTimeTokenStoreError::AlreadyPending;
        }
    }
    unexpected(e)
}

/// Only the (user, subject) index means "already pending"; a clash on the
/// token hash or id is a plain storage failure.
fn is_pending_conflict(constraint: Option<&str>) -> bool {
    constraint == Some(USER_SUBJECT_CONSTRAINT)
}

pub struct PostgresOneTimeTokenStore {
    pool: PgPool,
}

impl PostgresOneTimeTokenStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresOneTimeTokenStore { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OneTimeTokenRow {
    id: Uuid,
    user_id: Option<Uuid>,
    subject: String,
    token_hash: String,
    relates_to: String,
    metadata: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<OneTimeTokenRow> for OneTimeToken {
    type Error = OneTimeTokenStoreError;

    fn try_from(row: OneTimeTokenRow) -> Result<Self, Self::Error> {
        let subject = TokenSubject::from_str(&row.subject)
            .map_err(|e| OneTimeTokenStoreError::UnexpectedError(e.to_string()))?;

        Ok(OneTimeToken {
            id: row.id,
            user_id: row.user_id.map(UserId::from),
            subject,
            token_hash: TokenHash::from_hex(row.token_hash),
            relates_to: row.relates_to,
            metadata: row.metadata.0,
            created_at: row.created_at,
            expires_at: row.expires_at,
            last_sent_at: row.last_sent_at,
        })
    }
}

const SELECT_TOKEN: &str = r#"
    SELECT id, user_id, subject, token_hash, relates_to, metadata, created_at, expires_at, last_sent_at
    FROM one_time_tokens
"#;

fn unexpected(e: sqlx::Error) -> OneTimeTokenStoreError {
    OneTimeTokenStoreError::UnexpectedError(e.to_string())
}

#[async_trait::async_trait]
impl OneTimeTokenStore for PostgresOneTimeTokenStore {
    #[tracing::instrument(name = "Finding pending one-time tokens", skip_all)]
    async fn find_pending(
        &self,
        user_id: &UserId,
        subject: TokenSubject,
    ) -> Result<Vec<OneTimeToken>, OneTimeTokenStoreError> {
        let rows = sqlx::query_as::<_, OneTimeTokenRow>(&format!(
            "{SELECT_TOKEN} WHERE user_id = $1 AND subject = $2 ORDER BY created_at"
        ))
        .bind(user_id.as_uuid())
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows.into_iter().map(OneTimeToken::try_from).collect()
    }

    #[tracing::instrument(name = "Storing one-time token", skip_all)]
    async fn create_token(&self, token: OneTimeToken) -> Result<(), OneTimeTokenStoreError> {
        sqlx::query(
            r#"
                INSERT INTO one_time_tokens
                    (id, user_id, subject, token_hash, relates_to, metadata, created_at, expires_at, last_sent_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.as_ref().map(UserId::as_uuid))
        .bind(token.subject.as_str())
        .bind(token.token_hash.as_str())
        .bind(&token.relates_to)
        .bind(Json(&token.metadata))
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.last_sent_at)
        .execute(&self.pool)
        .await
        .map_err(map_create_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Recording one-time token delivery", skip_all)]
    async fn touch_last_sent(
        &self,
        id: &Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), OneTimeTokenStoreError> {
        let result = sqlx::query("UPDATE one_time_tokens SET last_sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(OneTimeTokenStoreError::TokenNotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Deleting one-time token", skip_all)]
    async fn delete_token(&self, id: &Uuid) -> Result<(), OneTimeTokenStoreError> {
        let result = sqlx::query("DELETE FROM one_time_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(OneTimeTokenStoreError::TokenNotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Looking up one-time token", skip_all)]
    async fn get_token_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<OneTimeToken>, OneTimeTokenStoreError> {
        let row = sqlx::query_as::<_, OneTimeTokenRow>(&format!(
            "{SELECT_TOKEN} WHERE token_hash = $1"
        ))
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(OneTimeToken::try_from).transpose()
    }
}
