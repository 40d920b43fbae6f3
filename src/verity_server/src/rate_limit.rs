//! Per-client token bucket applied in front of the API routes.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::time::Instant;
use verity_adapters::config::RateLimitSettings;
use verity_axum::ErrorResponse;

/// Buckets untouched for this long are dropped.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(3 * 60);
/// Minimum spacing between two sweeps of idle buckets.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Tokens added per second.
    pub requests_per_second: f64,
    /// Bucket capacity, and so the largest burst a fresh client may send.
    pub burst_size: f64,
    pub trust_forwarded_for: bool,
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            requests_per_second: f64::from(settings.requests_per_second),
            burst_size: f64::from(settings.burst_size),
            trust_forwarded_for: settings.trust_forwarded_for,
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: config.burst_size,
            last_refill: now,
        }
    }

    fn try_acquire(&mut self, config: &RateLimitConfig, now: Instant) -> RateLimitDecision {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.requests_per_second).min(config.burst_size);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateLimitDecision::Allowed
        } else {
            let wait = (1.0 - self.tokens) / config.requests_per_second;
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs_f64(wait),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Token buckets keyed by client address. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<DashMap<IpAddr, TokenBucket>>,
    last_sweep: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        let now = Instant::now();
        self.sweep_idle(now);

        let mut bucket = self
            .buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::full(&self.config, now));
        bucket.try_acquire(&self.config, now)
    }

    /// Drops idle buckets, at most once per [`SWEEP_INTERVAL`].
    fn sweep_idle(&self, now: Instant) {
        {
            let mut last_sweep = self
                .last_sweep
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if now.duration_since(*last_sweep) < SWEEP_INTERVAL {
                return;
            }
            *last_sweep = now;
        }

        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < IDLE_TIMEOUT);
        tracing::debug!(
            evicted = before.saturating_sub(self.buckets.len()),
            "swept idle rate limit buckets"
        );
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// First `X-Forwarded-For` entry when trusted, otherwise the peer address.
    fn client_ip(&self, request: &Request) -> Option<IpAddr> {
        let forwarded = self
            .config
            .trust_forwarded_for
            .then(|| forwarded_for(request))
            .flatten();

        forwarded.or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
    }
}

fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Requests whose client address cannot be determined pass through.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ip) = limiter.client_ip(&request) else {
        tracing::debug!("no client address available, skipping rate limit");
        return next.run(request).await;
    };

    match limiter.check(ip) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(client_ip = %ip, ?retry_after, "rate limit exceeded");
            too_many_requests(retry_after)
        }
    }
}

fn too_many_requests(retry_after: Duration) -> Response {
    let body = Json(ErrorResponse {
        error: "rate limit exceeded".to_string(),
    });
    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();

    let seconds = retry_after.as_secs_f64().ceil().max(1.0) as u64;
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    response
}
