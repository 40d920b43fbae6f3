use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header, request},
    middleware,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use verity_adapters::config::{AllowedOrigins, RateLimitSettings};
use verity_axum::{AppState, api_router, health_check};

use crate::{
    rate_limit::{RateLimiter, rate_limit},
    security_headers::with_security_headers,
    telemetry::{make_span_with_request_id, on_request, on_response},
};

pub const API_PREFIX: &str = "/api/v1";

/// The authentication HTTP service: `/api/v1` routes plus `/healthz`.
pub struct AuthService {
    api: Router,
    rate_limiter: Option<RateLimiter>,
}

impl AuthService {
    pub fn new(state: AppState) -> Self {
        Self {
            api: api_router(state),
            rate_limiter: None,
        }
    }

    /// Limits `/api/v1` per client address. `/healthz` is never limited.
    pub fn with_rate_limit(mut self, settings: &RateLimitSettings) -> Self {
        self.rate_limiter = settings
            .enabled
            .then(|| RateLimiter::new(settings.into()));
        self
    }

    fn with_trace_layer(router: Router) -> Router {
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        )
    }

    /// Converts the service into a router that can be nested into another application.
    ///
    /// CORS is only enabled when `allowed_origins` is given. Rate limiting
    /// needs the peer address, so the outer application should be served with
    /// `into_make_service_with_connect_info::<SocketAddr>()`.
    pub fn as_nested_router(self, allowed_origins: Option<AllowedOrigins>) -> Router {
        let mut api = self.api;
        if let Some(limiter) = self.rate_limiter {
            api = api.layer(middleware::from_fn_with_state(limiter, rate_limit));
        }

        let mut router = Router::new()
            .nest(API_PREFIX, api)
            .route("/healthz", get(health_check));

        if let Some(allowed_origins) = allowed_origins {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-app-audience"),
                ])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));

            router = router.layer(cors);
        }

        Self::with_trace_layer(with_security_headers(router))
    }

    pub async fn run_standalone(
        self,
        listener: TcpListener,
        allowed_origins: Option<AllowedOrigins>,
    ) -> Result<(), std::io::Error> {
        let router = self.as_nested_router(allowed_origins);

        tracing::info!("Auth service listening on {}", listener.local_addr()?);

        axum_server::Server::<SocketAddr>::from_listener(listener)
            .serve(router.into_make_service_with_connect_info::<SocketAddr>())
            .await
    }
}
