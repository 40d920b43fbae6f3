//! Route handlers of the `/api/v1` surface.

pub mod email_verification;
pub mod health;
pub mod me;
pub mod password;
pub mod sign_in;
pub mod users;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

pub use email_verification::{initiate_email_verification, verify_email};
pub use health::health_check;
pub use me::me;
pub use password::update_password;
pub use sign_in::sign_in;
pub use users::register_user;

use crate::middleware::require_bearer;
use crate::state::AppState;

/// Every route of the API, meant to be nested under `/api/v1`.
pub fn api_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/password", put(update_password))
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/users", post(register_user))
        .route("/auth/email-verification", post(initiate_email_verification))
        .route("/auth/verify-email", get(verify_email))
        .route("/auth/sign-in", post(sign_in))
        .merge(protected)
        .with_state(state)
}
