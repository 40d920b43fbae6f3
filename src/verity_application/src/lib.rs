pub mod authenticator;
pub mod error;
pub mod one_time_tokens;
pub mod sessions;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticator::{
    Authenticator, AuthenticatorBuilder, AuthenticatorSettings, ConfigurationError,
};
pub use error::{AuthError, AuthErrorKind};
pub use one_time_tokens::{IssuanceLocks, IssuedToken, OneTimeTokenManager};
pub use sessions::SessionIssuer;
pub use use_cases::{
    initiate_email_verification::{
        InitiateEmailVerificationUseCase, VERIFICATION_EMAIL_SUBJECT, VERIFY_EMAIL_PATH,
    },
    register_user::RegisterUserUseCase,
    set_password::{SetUserPasswordUseCase, UpdateUserPasswordUseCase},
    sign_in::{AuthenticatedUser, SignInRequest, SignInUseCase},
    validate_email_verification::ValidateEmailVerificationUseCase,
};
