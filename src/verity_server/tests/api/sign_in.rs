use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::helpers::{DISPLAY_NAME, PASSWORD, TestApp, unique_email};

#[tokio::test]
async fn verified_user_signs_in() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;

    let response = app.sign_in(&email, PASSWORD, None).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["display_name"], DISPLAY_NAME);
    assert!(body["access_token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    assert!(body["refresh_token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    assert_ne!(body["access_token"], body["refresh_token"]);
    assert!(body["session_id"].is_string());

    let expiry: DateTime<Utc> = serde_json::from_value(body["token_expiry"].clone()).unwrap();
    assert!(expiry > Utc::now());
}

#[tokio::test]
async fn every_sign_in_opens_a_new_session() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;

    let first: Value = app.sign_in(&email, PASSWORD, None).await.json().await.unwrap();
    let second: Value = app.sign_in(&email, PASSWORD, None).await.json().await.unwrap();

    assert_ne!(first["session_id"], second["session_id"]);
}

#[tokio::test]
async fn unverified_user_is_refused() {
    let app = TestApp::new().await;
    let email = unique_email();
    app.register(DISPLAY_NAME, &email, PASSWORD).await;

    let response = app.sign_in(&email, PASSWORD, None).await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;

    let wrong_password = app.sign_in(&email, "not the password", None).await;
    let unknown_user = app.sign_in(&unique_email(), PASSWORD, None).await;

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_user.status(), 401);
    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_user: Value = unknown_user.json().await.unwrap();
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn empty_credentials_are_unauthorized_and_malformed_ones_invalid() {
    let app = TestApp::new().await;

    assert_eq!(app.sign_in("", "", None).await.status(), 401);
    assert_eq!(app.sign_in(&unique_email(), "", None).await.status(), 401);
    assert_eq!(app.sign_in("not-an-email", PASSWORD, None).await.status(), 400);
    assert_eq!(app.sign_in(&unique_email(), "short", None).await.status(), 400);
}

#[tokio::test]
async fn audience_defaults_and_can_be_overridden() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;

    let default_token = app.access_token(&email, PASSWORD).await;
    let claims: Value = app.me(Some(&default_token)).await.json().await.unwrap();
    assert_eq!(claims["audience"], "client-app");

    let response = app.sign_in(&email, PASSWORD, Some("admin-console")).await;
    let body: Value = response.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap();
    let claims: Value = app.me(Some(token)).await.json().await.unwrap();
    assert_eq!(claims["audience"], "admin-console");
    assert_eq!(claims["session_id"], body["session_id"]);
    assert_eq!(claims["user_id"], body["user"]["id"]);
}
