use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use uuid::Uuid;
use verity_core::{CredentialStore, CredentialStoreError, HashedPassword, UserId, UserPassword};

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresCredentialStore { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PasswordRow {
    user_id: Uuid,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<PasswordRow> for UserPassword {
    fn from(row: PasswordRow) -> Self {
        UserPassword {
            user_id: UserId::from(row.user_id),
            password_hash: HashedPassword::new(Secret::from(row.password_hash)),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[tracing::instrument(name = "Retrieving password hash from PostgreSQL", skip_all)]
    async fn get_password(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserPassword>, CredentialStoreError> {
        let row = sqlx::query_as::<_, PasswordRow>(
            r#"
                SELECT user_id, password_hash, created_at, updated_at
                FROM user_passwords
                WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialStoreError::UnexpectedError(e.to_string()))?;

        Ok(row.map(UserPassword::from))
    }

    #[tracing::instrument(name = "Storing password hash in PostgreSQL", skip_all)]
    async fn create_password(&self, password: UserPassword) -> Result<(), CredentialStoreError> {
        sqlx::query(
            r#"
                INSERT INTO user_passwords (user_id, password_hash, created_at, updated_at)
                VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(password.user_id.as_uuid())
        .bind(password.password_hash.as_ref().expose_secret())
        .bind(password.created_at)
        .bind(password.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return CredentialStoreError::PasswordAlreadySet;
                }
            }
            CredentialStoreError::UnexpectedError(e.to_string())
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Replacing password hash in PostgreSQL", skip_all)]
    async fn upsert_password(&self, password: UserPassword) -> Result<(), CredentialStoreError> {
        sqlx::query(
            r#"
                INSERT INTO user_passwords (user_id, password_hash, created_at, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id) DO UPDATE
                SET password_hash = EXCLUDED.password_hash, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(password.user_id.as_uuid())
        .bind(password.password_hash.as_ref().expose_secret())
        .bind(password.created_at)
        .bind(password.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CredentialStoreError::UnexpectedError(e.to_string()))?;

        Ok(())
    }
}
