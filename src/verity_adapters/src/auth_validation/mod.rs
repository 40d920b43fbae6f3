pub mod bearer_token_validator;
pub mod jwt_codec;

pub use bearer_token_validator::{BearerAuthError, BearerTokenValidator, extract_bearer_token};
pub use jwt_codec::{JwtConfig, JwtTokenCodec};
