use axum::Json;
use verity_core::AuthenticatedClaims;

use crate::middleware::Authenticated;

pub async fn me(Authenticated(claims): Authenticated) -> Json<AuthenticatedClaims> {
    Json(claims)
}
