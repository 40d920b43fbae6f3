use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::Duration;
use config::{Config, Environment, File};
use http::HeaderValue;
use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use verity_application::AuthenticatorSettings;
use verity_core::Email;

use super::constants::{CONFIG_DIR, DEFAULT_MODE, env, prod};
use crate::auth_validation::JwtConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub auth: AuthSettings,
    pub postgres: PostgresSettings,
    pub email_client: EmailClientSettings,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub mode: String,
    pub name: String,
    /// Public URL of this service; verification links are built from it.
    pub base_url: Url,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl AppSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `None` when no origin is configured, which leaves CORS off.
    pub fn allowed_origins(&self) -> Option<AllowedOrigins> {
        if self.allowed_origins.is_empty() {
            return None;
        }
        AllowedOrigins::parse(&self.allowed_origins).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt: JwtSettings,
    pub verification_token_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: Secret<String>,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub default_audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    pub url: Secret<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailClientSettings {
    pub base_url: Url,
    pub sender: String,
    pub auth_token: Secret<String>,
    pub timeout_millis: u64,
}

impl EmailClientSettings {
    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.timeout_millis)
    }

    /// Without a Postmark token, mail is only recorded in memory.
    pub fn has_auth_token(&self) -> bool {
        !self.auth_token.expose_secret().is_empty()
    }
}

/// Per-client token bucket applied to the API routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Sustained rate; the bucket refills at this many tokens per second.
    pub requests_per_second: u32,
    pub burst_size: u32,
    /// Key clients by the first `X-Forwarded-For` entry instead of the peer
    /// address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

/// CORS origins accepted by the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowedOrigins(Vec<HeaderValue>);

impl AllowedOrigins {
    pub fn parse(origins: &[String]) -> Result<Self, SettingsError> {
        origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim()).map_err(|e| {
                    SettingsError::invalid("app.allowed_origins", format!("{origin}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        self.0.contains(origin)
    }
}

impl Settings {
    /// Reads `.env`, then layers defaults, `config/base.json`,
    /// `config/{APP_MODE}.json` and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        let vars: config::Map<String, String> = std::env::vars().collect();
        Self::load_from(Path::new(CONFIG_DIR), vars)
    }

    pub fn load_from(
        config_dir: &Path,
        vars: config::Map<String, String>,
    ) -> Result<Self, SettingsError> {
        let mode = vars
            .get(env::APP_MODE_ENV_VAR)
            .filter(|mode| !mode.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_MODE.to_string());
        let well_known = |name: &str| vars.get(name).filter(|value| !value.is_empty()).cloned();

        let settings: Settings = Config::builder()
            .set_default("app.mode", mode.as_str())?
            .set_default("app.name", "Verity")?
            .set_default(
                "app.base_url",
                format!("http://localhost:{}/", prod::APP_PORT),
            )?
            .set_default("app.host", prod::APP_HOST)?
            .set_default("app.port", i64::from(prod::APP_PORT))?
            .set_default("app.allowed_origins", Vec::<String>::new())?
            .set_default("auth.jwt.secret", "")?
            .set_default("auth.jwt.algorithm", "HS256")?
            .set_default("auth.jwt.issuer", "verity")?
            .set_default("auth.jwt.access_token_ttl_secs", 86_400_i64)?
            .set_default("auth.jwt.refresh_token_ttl_secs", 604_800_i64)?
            .set_default("auth.jwt.default_audience", "client-app")?
            .set_default("auth.verification_token_ttl_secs", 900_i64)?
            .set_default("postgres.url", "")?
            .set_default("postgres.max_connections", 5_i64)?
            .set_default("email_client.base_url", prod::email_client::BASE_URL)?
            .set_default("email_client.sender", prod::email_client::SENDER)?
            .set_default("email_client.auth_token", "")?
            .set_default(
                "email_client.timeout_millis",
                prod::email_client::TIMEOUT.as_millis() as i64,
            )?
            .set_default("rate_limit.enabled", true)?
            .set_default(
                "rate_limit.requests_per_second",
                i64::from(prod::rate_limit::REQUESTS_PER_SECOND),
            )?
            .set_default(
                "rate_limit.burst_size",
                i64::from(prod::rate_limit::BURST_SIZE),
            )?
            .set_default("rate_limit.trust_forwarded_for", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?
            .add_source(File::from(config_dir.join("base.json")).required(false))
            .add_source(File::from(config_dir.join(format!("{mode}.json"))).required(false))
            .add_source(
                Environment::with_prefix(env::SETTINGS_ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("app.allowed_origins")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option("auth.jwt.secret", well_known(env::JWT_SECRET_ENV_VAR))?
            .set_override_option("postgres.url", well_known(env::DATABASE_URL_ENV_VAR))?
            .set_override_option(
                "email_client.auth_token",
                well_known(env::POSTMARK_AUTH_TOKEN_ENV_VAR),
            )?
            .set_override_option("app.base_url", well_known(env::APP_BASE_URL_ENV_VAR))?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let jwt = &self.auth.jwt;
        if jwt.secret.expose_secret().is_empty() {
            return Err(SettingsError::invalid(
                "auth.jwt.secret",
                format!("must be set, e.g. through {}", env::JWT_SECRET_ENV_VAR),
            ));
        }
        if !matches!(
            jwt.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(SettingsError::invalid(
                "auth.jwt.algorithm",
                "only HS256, HS384 and HS512 are supported",
            ));
        }
        if jwt.access_token_ttl_secs <= 0 || jwt.refresh_token_ttl_secs <= 0 {
            return Err(SettingsError::invalid(
                "auth.jwt",
                "token lifetimes must be positive",
            ));
        }
        if self.auth.verification_token_ttl_secs <= 0 {
            return Err(SettingsError::invalid(
                "auth.verification_token_ttl_secs",
                "must be positive",
            ));
        }
        if !matches!(self.app.base_url.scheme(), "http" | "https") {
            return Err(SettingsError::invalid(
                "app.base_url",
                "must be an http(s) URL",
            ));
        }
        let rate_limit = &self.rate_limit;
        if rate_limit.enabled && (rate_limit.requests_per_second == 0 || rate_limit.burst_size == 0)
        {
            return Err(SettingsError::invalid(
                "rate_limit",
                "requests_per_second and burst_size must be positive when enabled",
            ));
        }
        AllowedOrigins::parse(&self.app.allowed_origins)?;
        self.email_sender()?;
        Ok(())
    }

    pub fn email_sender(&self) -> Result<Email, SettingsError> {
        Email::try_from(Secret::from(self.email_client.sender.clone()))
            .map_err(|e| SettingsError::invalid("email_client.sender", e.to_string()))
    }

    pub fn jwt_config(&self) -> JwtConfig {
        let jwt = &self.auth.jwt;
        JwtConfig {
            secret: jwt.secret.clone(),
            algorithm: jwt.algorithm,
            issuer: jwt.issuer.clone(),
            access_token_ttl: Duration::seconds(jwt.access_token_ttl_secs),
            refresh_token_ttl: Duration::seconds(jwt.refresh_token_ttl_secs),
        }
    }

    pub fn authenticator_settings(&self) -> AuthenticatorSettings {
        AuthenticatorSettings {
            base_url: self.app.base_url.clone(),
            app_name: self.app.name.clone(),
            default_audience: self.auth.jwt.default_audience.clone(),
            verification_token_ttl: Duration::seconds(self.auth.verification_token_ttl_secs),
        }
    }
}
