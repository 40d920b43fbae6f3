use serde_json::Value;

use crate::helpers::{DISPLAY_NAME, PASSWORD, TestApp, unique_email};

#[tokio::test]
async fn register_returns_201_with_the_new_id() {
    let app = TestApp::new().await;

    let response = app.register(DISPLAY_NAME, &unique_email(), PASSWORD).await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["id"].as_str().is_some_and(|id| uuid::Uuid::parse_str(id).is_ok()));
    assert!(body["username"].as_str().unwrap().starts_with("user"));
}

#[tokio::test]
async fn duplicate_email_returns_409() {
    let app = TestApp::new().await;
    let email = unique_email();
    assert_eq!(app.register(DISPLAY_NAME, &email, PASSWORD).await.status(), 201);

    let response = app
        .register(DISPLAY_NAME, &email.to_uppercase(), PASSWORD)
        .await;

    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn invalid_input_returns_400() {
    let app = TestApp::new().await;

    let cases = [
        (DISPLAY_NAME, "not-an-email".to_string(), PASSWORD),
        ("Too short", unique_email(), PASSWORD),
        (DISPLAY_NAME, unique_email(), "short"),
    ];

    for (display_name, email, password) in cases {
        let response = app.register(display_name, &email, password).await;
        assert_eq!(
            response.status(),
            400,
            "did not reject display name {display_name:?}, email {email:?}, password {password:?}"
        );
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/v1/users", &serde_json::json!({ "email": unique_email() }))
        .await;

    assert!(response.status().is_client_error());
}
