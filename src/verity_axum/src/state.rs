use std::sync::Arc;

use verity_adapters::BearerTokenValidator;
use verity_application::Authenticator;

/// Shared by every route; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub validator: BearerTokenValidator,
}

impl AppState {
    /// Bearer tokens are checked with the same codec the authenticator signs with.
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        let validator = BearerTokenValidator::new(authenticator.token_codec());
        Self {
            authenticator,
            validator,
        }
    }
}
