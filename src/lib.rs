//! # Verity - Authentication and Session Core
//!
//! Facade crate re-exporting the public APIs of the verity components, so an
//! application can depend on a single crate.
//!
//! ## Usage
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! verity = { path = "../verity" }
//! ```
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `User`, `OneTimeToken`, `Session`, etc.
//! - **Ports**: `UserStore`, `OneTimeTokenStore`, `CredentialStore`, `SessionStore`,
//!   `EmailClient`, `PasswordHasher`, `TokenCodec`
//! - **Application**: `Authenticator` and the use cases behind it
//! - **Adapters**: PostgreSQL and in-memory stores, Postmark, Argon2, JWT, settings
//! - **HTTP**: axum routes, bearer middleware and `AuthService`

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use verity_core::*;
}

pub use verity_core::{
    AuthenticatedClaims, DisplayName, Email, OneTimeToken, Password, RefreshToken, Session,
    SessionId, TokenSubject, User, UserError, UserId,
};

// ============================================================================
// Repository and Service Traits (Ports)
// ============================================================================

/// Repository trait definitions
pub mod repositories {
    pub use verity_core::{
        CredentialStore, CredentialStoreError, OneTimeTokenStore, OneTimeTokenStoreError,
        SessionStore, SessionStoreError, UserStore, UserStoreError,
    };
}

pub use verity_core::{
    CredentialStore, EmailClient, EmailTemplate, OneTimeTokenStore, PasswordHasher,
    SessionStore, TokenCodec, UserStore,
};

// ============================================================================
// Application Layer
// ============================================================================

/// Use cases and the authenticator that wires them
pub mod use_cases {
    pub use verity_application::*;
}

pub use verity_application::{
    AuthError, AuthErrorKind, AuthenticatedUser, Authenticator, AuthenticatorBuilder,
    AuthenticatorSettings, ConfigurationError, SignInRequest,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Persistence implementations
    pub mod persistence {
        pub use verity_adapters::persistence::*;
    }

    /// Email client implementations
    pub mod email {
        pub use verity_adapters::email::*;
    }

    /// JWT signing and bearer validation
    pub mod auth {
        pub use verity_adapters::auth_validation::*;
    }

    /// Password hashing
    pub mod crypto {
        pub use verity_adapters::crypto::*;
    }

    /// Configuration
    pub mod config {
        pub use verity_adapters::config::*;
    }
}

pub use verity_adapters::{
    Argon2PasswordHasher, JwtTokenCodec, MockEmailClient, PostmarkEmailClient, Settings,
    persistence::{
        HashMapCredentialStore, HashMapOneTimeTokenStore, HashMapSessionStore, HashMapUserStore,
        PostgresCredentialStore, PostgresOneTimeTokenStore, PostgresSessionStore,
        PostgresUserStore,
    },
};

// ============================================================================
// HTTP Layer
// ============================================================================

/// axum routes, extractors and error mapping
pub mod http_api {
    pub use verity_axum::*;
}

pub use verity_axum::{AppState, AuthApiError, Authenticated};

// ============================================================================
// Auth Service (Main Entry Point)
// ============================================================================

pub use verity_server::{
    AuthService, BootstrapError, RateLimiter, build_authenticator, build_in_memory_authenticator,
    configure_email_client, configure_postgresql, connect_postgres, init_tracing,
};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the port traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};

pub use http;
