use serde_json::Value;
use verity_adapters::config::RateLimitSettings;

use crate::helpers::TestApp;

fn strict_limit() -> RateLimitSettings {
    RateLimitSettings {
        enabled: true,
        requests_per_second: 1,
        burst_size: 2,
        trust_forwarded_for: false,
    }
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::new().await;

    for response in [app.get("/healthz").await, app.me(None).await] {
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(
            headers["strict-transport-security"],
            "max-age=31536000; includeSubDomains"
        );
        assert_eq!(
            headers["content-security-policy"],
            "default-src 'none'; frame-ancestors 'none'"
        );
    }
}

#[tokio::test]
async fn exhausted_burst_returns_429_with_retry_after() {
    let app = TestApp::with_rate_limit(strict_limit()).await;

    assert_eq!(app.me(None).await.status(), 401);
    assert_eq!(app.me(None).await.status(), 401);
    let response = app.me(None).await;

    assert_eq!(response.status(), 429);
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "rate limit exceeded");
}

#[tokio::test]
async fn health_check_is_not_rate_limited() {
    let app = TestApp::with_rate_limit(strict_limit()).await;

    for _ in 0..5 {
        assert_eq!(app.get("/healthz").await.status(), 200);
    }
}

#[tokio::test]
async fn disabled_rate_limit_lets_bursts_through() {
    let app = TestApp::with_rate_limit(RateLimitSettings {
        enabled: false,
        ..strict_limit()
    })
    .await;

    for _ in 0..5 {
        assert_eq!(app.me(None).await.status(), 401);
    }
}
