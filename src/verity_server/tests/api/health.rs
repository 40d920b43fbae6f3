use crate::helpers::TestApp;

#[tokio::test]
async fn healthz_returns_200() {
    let app = TestApp::new().await;

    let response = app.get("/healthz").await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/api/v1/nope").await.status(), 404);
}
