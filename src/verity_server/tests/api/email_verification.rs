use serde_json::{Value, json};

use crate::helpers::{DISPLAY_NAME, PASSWORD, TestApp, token_from, unique_email};

#[tokio::test]
async fn verification_link_points_at_the_verify_endpoint() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;

    let response = app.request_verification(&email, None).await;

    assert_eq!(response.status(), 200);
    let urls = app.verification_urls(&email).await;
    assert_eq!(urls.len(), 1);
    assert_eq!(
        urls[0].as_str().split('?').next().unwrap(),
        format!("{}/api/v1/auth/verify-email", app.address)
    );
    assert_eq!(urls[0].query_pairs().count(), 1);
    assert!(!urls[0].as_str().contains(&email));
}

#[tokio::test]
async fn verifying_without_redirect_returns_200_and_enables_sign_in() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;
    app.request_verification(&email, None).await;

    assert_eq!(app.sign_in(&email, PASSWORD, None).await.status(), 401);

    let token = app.latest_verification_token(&email).await;
    let response = app.verify_email(&token).await;
    assert_eq!(response.status(), 200);

    assert_eq!(app.sign_in(&email, PASSWORD, None).await.status(), 200);
}

#[tokio::test]
async fn verifying_with_stored_redirect_returns_303() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;
    app.request_verification(&email, Some("https://app.example.com/welcome"))
        .await;

    let token = app.latest_verification_token(&email).await;
    let response = app.verify_email(&token).await;

    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "https://app.example.com/welcome"
    );
}

#[tokio::test]
async fn non_http_redirect_is_rejected() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;

    let response = app
        .request_verification(&email, Some("javascript:alert(1)"))
        .await;

    assert_eq!(response.status(), 400);
    assert!(app.verification_urls(&email).await.is_empty());
}

#[tokio::test]
async fn token_is_single_use() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;
    app.request_verification(&email, None).await;
    let token = app.latest_verification_token(&email).await;

    assert_eq!(app.verify_email(&token).await.status(), 200);
    assert_eq!(app.verify_email(&token).await.status(), 401);
}

#[tokio::test]
async fn unknown_missing_or_garbage_tokens_return_401() {
    let app = TestApp::new().await;

    assert_eq!(app.verify_email("not-a-real-token").await.status(), 401);
    assert_eq!(app.verify_email("").await.status(), 401);
    assert_eq!(app.get("/api/v1/auth/verify-email").await.status(), 401);
}

#[tokio::test]
async fn resending_invalidates_the_previous_link() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;

    app.request_verification(&email, None).await;
    let first = app.latest_verification_token(&email).await;
    app.request_verification(&email, None).await;
    let second = app.latest_verification_token(&email).await;

    assert_ne!(first, second);
    assert_eq!(app.verify_email(&first).await.status(), 401);
    assert_eq!(app.verify_email(&second).await.status(), 200);
}

#[tokio::test]
async fn concurrent_resends_leave_exactly_one_usable_link() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;

    let mut requests = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = app.http_client.clone();
        let url = format!("{}/api/v1/auth/email-verification", app.address);
        let body = json!({ "email": email });
        requests.spawn(async move {
            client
                .post(url)
                .json(&body)
                .send()
                .await
                .expect("Failed to execute request.")
                .status()
                .as_u16()
        });
    }
    let statuses = requests.join_all().await;
    assert!(statuses.iter().all(|status| *status == 200), "{statuses:?}");

    let tokens: Vec<String> = app
        .verification_urls(&email)
        .await
        .iter()
        .map(token_from)
        .collect();
    assert_eq!(tokens.len(), 8);

    let mut accepted = 0;
    for token in &tokens {
        if app.verify_email(token).await.status() == 200 {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn unknown_email_returns_404_and_verified_email_returns_400() {
    let app = TestApp::new().await;

    let response = app.request_verification(&unique_email(), None).await;
    assert_eq!(response.status(), 404);

    let email = app.verified_user().await;
    let response = app.request_verification(&email, None).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "email is already verified");
}
