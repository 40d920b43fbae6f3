use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use uuid::Uuid;
use verity_core::{Email, User, UserId, UserStore, UserStoreError};

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresUserStore { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    display_name: String,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    email_verified_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = UserStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::try_from(Secret::from(row.email))
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        Ok(User {
            id: UserId::from(row.id),
            display_name: row.display_name,
            username: row.username,
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
            email_verified_at: row.email_verified_at,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn add_user(&self, user: User) -> Result<(), UserStoreError> {
        sqlx::query(
            r#"
                INSERT INTO users (id, display_name, username, email, created_at, updated_at, email_verified_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.display_name)
        .bind(&user.username)
        .bind(user.email.as_ref().expose_secret())
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.email_verified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return UserStoreError::UserAlreadyExists;
                }
            }
            UserStoreError::UnexpectedError(e.to_string())
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving user from PostgreSQL", skip_all)]
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, UserStoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                SELECT id, display_name, username, email, created_at, updated_at, email_verified_at
                FROM users
                WHERE email = $1
            "#,
        )
        .bind(email.as_ref().expose_secret())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(name = "Checking user exists in PostgreSQL", skip_all)]
    async fn user_exists(&self, id: &UserId) -> Result<bool, UserStoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))
    }

    #[tracing::instrument(name = "Marking email verified in PostgreSQL", skip_all)]
    async fn mark_email_verified(
        &self,
        id: &UserId,
        verified_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE users
                SET email_verified_at = $2, updated_at = $2
                WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(verified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::UserNotFound);
        }
        Ok(())
    }
}
