use async_trait::async_trait;

/// Validates the credentials a request carries before it reaches a protected route.
///
/// Receives request parts (headers, method, URI, extensions) rather than the full
/// request, so non-`Sync` bodies never cross the await point.
#[async_trait]
pub trait AuthValidator: Clone + Send + Sync + 'static {
    /// What protected handlers get to see once validation succeeded.
    type Claims: Clone + Send + Sync + 'static;

    /// Typically `http::request::Parts`.
    type RequestParts;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Extracts the credential from `parts` and verifies it.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is present or it doesn't verify.
    async fn validate(&self, parts: &Self::RequestParts) -> Result<Self::Claims, Self::Error>;
}
