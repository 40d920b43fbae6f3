pub mod domain;
pub mod ports;
pub mod strategies;

// Re-export commonly used types for convenience
pub use domain::{
    claims::{
        AuthenticatedClaims, ClaimsError, EMAIL_CLAIM, RESERVED_CLAIMS, SESSION_ID_CLAIM,
        TokenClaims, TokenType, USER_ID_CLAIM,
    },
    credential::{HashedPassword, UserPassword},
    email::Email,
    one_time_token::{
        OneTimeSecret, OneTimeToken, REDIRECT_TO_METADATA_KEY, TokenSubject, UnknownTokenSubject,
    },
    password::{MIN_PASSWORD_LENGTH, Password},
    session::{ClientMetadata, RefreshToken, Session, SessionId},
    token_hash::{TokenHash, hash_token},
    user::{DisplayName, User, UserError, UserId, derive_username},
};

pub use ports::{
    repositories::{
        CredentialStore, CredentialStoreError, OneTimeTokenStore, OneTimeTokenStoreError,
        SessionStore, SessionStoreError, UserStore, UserStoreError,
    },
    services::{
        EmailClient, EmailTemplate, PasswordHasher, PasswordHasherError, TokenCodec,
        TokenCodecError,
    },
};

pub use strategies::auth_validator::AuthValidator;
