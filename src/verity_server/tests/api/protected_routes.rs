use serde_json::Value;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn me_requires_a_bearer_token() {
    let app = TestApp::new().await;

    assert_eq!(app.me(None).await.status(), 401);
    assert_eq!(app.me(Some("garbage")).await.status(), 401);

    let response = app
        .http_client
        .get(format!("{}/api/v1/auth/me", app.address))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;

    let body: Value = app.sign_in(&email, PASSWORD, None).await.json().await.unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    assert_eq!(app.me(Some(refresh_token)).await.status(), 401);
}

#[tokio::test]
async fn password_update_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .http_client
        .put(format!("{}/api/v1/auth/password", app.address))
        .json(&serde_json::json!({ "password": "a brand new password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn updated_password_replaces_the_old_one() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;
    let token = app.access_token(&email, PASSWORD).await;

    let response = app.update_password(&token, "a brand new password").await;
    assert_eq!(response.status(), 204);

    assert_eq!(app.sign_in(&email, PASSWORD, None).await.status(), 401);
    assert_eq!(
        app.sign_in(&email, "a brand new password", None).await.status(),
        200
    );
}

#[tokio::test]
async fn weak_new_password_is_rejected() {
    let app = TestApp::new().await;
    let email = app.verified_user().await;
    let token = app.access_token(&email, PASSWORD).await;

    let response = app.update_password(&token, "short").await;

    assert_eq!(response.status(), 400);
    assert_eq!(app.sign_in(&email, PASSWORD, None).await.status(), 200);
}
