pub mod auth_service;
pub mod cli;
pub mod helpers;
pub mod migrations;
pub mod rate_limit;
pub mod security_headers;
pub mod telemetry;

pub use auth_service::{API_PREFIX, AuthService};
pub use helpers::{
    BootstrapError, MIGRATOR, build_authenticator, build_in_memory_authenticator,
    configure_email_client, configure_postgresql, connect_postgres, get_postgres_pool,
};
pub use rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter};
pub use telemetry::init_tracing;
