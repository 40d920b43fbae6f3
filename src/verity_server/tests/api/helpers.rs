use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;
use verity_adapters::{
    Argon2PasswordHasher, MockEmailClient, Settings,
    config::{RateLimitSettings, env, test as test_constants},
};
use verity_axum::AppState;
use verity_core::EmailTemplate;
use verity_server::{AuthService, build_in_memory_authenticator};

pub const PASSWORD: &str = "correct horse battery";
pub const DISPLAY_NAME: &str = "Integration Tester";

pub struct TestApp {
    pub address: String,
    pub http_client: reqwest::Client,
    pub email_client: MockEmailClient,
}

impl TestApp {
    /// Rate limiting is off so tests can fire requests freely.
    pub async fn new() -> Self {
        Self::spawn(None).await
    }

    pub async fn with_rate_limit(rate_limit: RateLimitSettings) -> Self {
        Self::spawn(Some(rate_limit)).await
    }

    async fn spawn(rate_limit: Option<RateLimitSettings>) -> Self {
        let listener = TcpListener::bind(test_constants::APP_ADDRESS)
            .await
            .expect("Failed to bind test listener");
        let address = format!("http://{}", listener.local_addr().unwrap());

        let vars = [
            (env::JWT_SECRET_ENV_VAR, "integration-test-secret"),
            (env::APP_BASE_URL_ENV_VAR, &format!("{address}/")),
            ("VERITY__EMAIL_CLIENT__SENDER", test_constants::email_client::SENDER),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let settings = Settings::load_from(Path::new("does-not-exist"), vars)
            .expect("Failed to load test settings");

        let email_client = MockEmailClient::new();
        let authenticator = build_in_memory_authenticator(
            &settings,
            Arc::new(email_client.clone()),
            // Cheapest parameters argon2 accepts.
            Arc::new(Argon2PasswordHasher::new(8, 1, 1).unwrap()),
        )
        .expect("Failed to build authenticator");

        let mut service = AuthService::new(AppState::new(Arc::new(authenticator)));
        if let Some(rate_limit) = rate_limit {
            service = service.with_rate_limit(&rate_limit);
        }
        tokio::spawn(service.run_standalone(listener, None));

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            address,
            http_client,
            email_client,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http_client
            .get(format!("{}{path}", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.http_client
            .post(format!("{}{path}", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, display_name: &str, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/api/v1/users",
            &json!({ "display_name": display_name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn request_verification(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> reqwest::Response {
        let mut body = json!({ "email": email });
        if let Some(redirect_to) = redirect_to {
            body["redirect_to"] = json!(redirect_to);
        }
        self.post_json("/api/v1/auth/email-verification", &body).await
    }

    pub async fn verify_email(&self, token: &str) -> reqwest::Response {
        self.http_client
            .get(format!("{}/api/v1/auth/verify-email", self.address))
            .query(&[("token", token)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        audience: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .http_client
            .post(format!("{}/api/v1/auth/sign-in", self.address))
            .header("User-Agent", "verity-tests/1.0")
            .json(&json!({ "email": email, "password": password }));
        if let Some(audience) = audience {
            request = request.header("X-App-Audience", audience);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn me(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http_client.get(format!("{}/api/v1/auth/me", self.address));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn update_password(&self, token: &str, password: &str) -> reqwest::Response {
        self.http_client
            .put(format!("{}/api/v1/auth/password", self.address))
            .bearer_auth(token)
            .json(&json!({ "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Verification links mailed to `email`, oldest first.
    pub async fn verification_urls(&self, email: &str) -> Vec<Url> {
        self.email_client
            .sent()
            .await
            .into_iter()
            .filter(|mail| mail.recipients.iter().any(|r| r == email))
            .map(|mail| match mail.template {
                EmailTemplate::EmailVerification { verify_url, .. } => {
                    Url::parse(&verify_url).expect("verification link is a URL")
                }
            })
            .collect()
    }

    pub async fn latest_verification_token(&self, email: &str) -> String {
        let url = self
            .verification_urls(email)
            .await
            .pop()
            .expect("no verification email was sent");
        token_from(&url)
    }

    /// Registers and verifies a user, returning its email.
    pub async fn verified_user(&self) -> String {
        let email = unique_email();
        assert_eq!(self.register(DISPLAY_NAME, &email, PASSWORD).await.status(), 201);
        assert_eq!(self.request_verification(&email, None).await.status(), 200);
        let token = self.latest_verification_token(&email).await;
        assert_eq!(self.verify_email(&token).await.status(), 200);
        email
    }

    /// Signs a verified user in and returns the access token.
    pub async fn access_token(&self, email: &str, password: &str) -> String {
        let response = self.sign_in(email, password, None).await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub fn token_from(url: &Url) -> String {
    url.query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .expect("verification link has a token")
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", uuid::Uuid::new_v4().simple())
}
