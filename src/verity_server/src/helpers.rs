use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions};
use thiserror::Error;
use verity_adapters::{
    Argon2PasswordHasher, HashMapCredentialStore, HashMapOneTimeTokenStore, HashMapSessionStore,
    HashMapUserStore, JwtTokenCodec, MockEmailClient, PostgresCredentialStore,
    PostgresOneTimeTokenStore, PostgresSessionStore, PostgresUserStore, PostmarkEmailClient,
    Settings, SettingsError,
    config::{EmailClientSettings, PostgresSettings},
};
use verity_application::{Authenticator, AuthenticatorBuilder, ConfigurationError};
use verity_core::{EmailClient, PasswordHasher, PasswordHasherError};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const PRODUCTION_MODE: &str = "production";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Password hasher: {0}")]
    PasswordHasher(#[from] PasswordHasherError),
    #[error("HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("postgres.url is not set")]
    MissingDatabaseUrl,
    #[error("email_client.auth_token is required in production")]
    MissingEmailToken,
}

/// Connects to PostgreSQL without touching the schema.
pub async fn connect_postgres(settings: &PostgresSettings) -> Result<PgPool, BootstrapError> {
    let url = settings.url.expose_secret();
    if url.is_empty() {
        return Err(BootstrapError::MissingDatabaseUrl);
    }

    Ok(get_postgres_pool(url, settings.max_connections).await?)
}

/// Connects to PostgreSQL and applies pending migrations.
pub async fn configure_postgresql(settings: &PostgresSettings) -> Result<PgPool, BootstrapError> {
    let pg_pool = connect_postgres(settings).await?;
    MIGRATOR.run(&pg_pool).await?;

    Ok(pg_pool)
}

pub async fn get_postgres_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

/// Postmark when a token is configured; outside production, mail is only recorded.
pub fn configure_email_client(
    settings: &Settings,
) -> Result<Arc<dyn EmailClient>, BootstrapError> {
    let email_settings: &EmailClientSettings = &settings.email_client;

    if !email_settings.has_auth_token() {
        if settings.app.mode == PRODUCTION_MODE {
            return Err(BootstrapError::MissingEmailToken);
        }
        tracing::warn!("no Postmark token configured, emails are recorded but not sent");
        return Ok(Arc::new(MockEmailClient::new()));
    }

    let client = PostmarkEmailClient::with_timeout(
        email_settings.base_url.clone(),
        settings.email_sender()?,
        email_settings.auth_token.clone(),
        email_settings.timeout(),
    )?;
    Ok(Arc::new(client))
}

fn base_builder(
    settings: &Settings,
    password_hasher: Arc<dyn PasswordHasher>,
) -> AuthenticatorBuilder {
    Authenticator::builder(settings.authenticator_settings())
        .with_password_hasher(password_hasher)
        .with_token_codec(Arc::new(JwtTokenCodec::new(settings.jwt_config())))
}

/// Authenticator backed by PostgreSQL, hashing with the default Argon2 parameters.
pub fn build_authenticator(
    settings: &Settings,
    pool: PgPool,
    email_client: Arc<dyn EmailClient>,
) -> Result<Authenticator, BootstrapError> {
    let password_hasher = Arc::new(Argon2PasswordHasher::with_default_params()?);

    Ok(base_builder(settings, password_hasher)
        .with_user_store(Arc::new(PostgresUserStore::new(pool.clone())))
        .with_one_time_token_store(Arc::new(PostgresOneTimeTokenStore::new(pool.clone())))
        .with_credential_store(Arc::new(PostgresCredentialStore::new(pool.clone())))
        .with_session_store(Arc::new(PostgresSessionStore::new(pool)))
        .with_email_client(email_client)
        .build()?)
}

/// Authenticator with every store held in memory.
pub fn build_in_memory_authenticator(
    settings: &Settings,
    email_client: Arc<dyn EmailClient>,
    password_hasher: Arc<dyn PasswordHasher>,
) -> Result<Authenticator, BootstrapError> {
    Ok(base_builder(settings, password_hasher)
        .with_user_store(Arc::new(HashMapUserStore::new()))
        .with_one_time_token_store(Arc::new(HashMapOneTimeTokenStore::new()))
        .with_credential_store(Arc::new(HashMapCredentialStore::new()))
        .with_session_store(Arc::new(HashMapSessionStore::new()))
        .with_email_client(email_client)
        .build()?)
}
