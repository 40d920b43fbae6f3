pub mod constants;
pub mod settings;

pub use constants::*;
pub use settings::{
    AllowedOrigins, AppSettings, AuthSettings, EmailClientSettings, JwtSettings, LogFormat,
    LoggingSettings, PostgresSettings, RateLimitSettings, Settings, SettingsError,
};
