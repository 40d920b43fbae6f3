//! Axum binding for the Verity authentication core.
//!
//! ```ignore
//! let state = AppState::new(Arc::new(authenticator));
//! let app = Router::new().nest("/api/v1", verity_axum::api_router(state));
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{AuthApiError, ErrorResponse};
pub use middleware::{Authenticated, require_bearer};
pub use routes::{api_router, health_check};
pub use state::AppState;
