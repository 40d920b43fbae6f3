use std::time::Duration;

use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use verity_core::{Email, EmailClient, EmailTemplate};

use super::templates;

pub struct PostmarkEmailClient {
    http_client: Client,
    base_url: Url,
    sender: Email,
    authorization_token: Secret<String>,
}

impl PostmarkEmailClient {
    pub fn new(
        base_url: Url,
        sender: Email,
        authorization_token: Secret<String>,
        http_client: Client,
    ) -> Self {
        Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        }
    }

    pub fn with_timeout(
        base_url: Url,
        sender: Email,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(base_url, sender, authorization_token, http_client))
    }
}

#[async_trait::async_trait]
impl EmailClient for PostmarkEmailClient {
    #[tracing::instrument(name = "Sending email", skip_all, fields(template = template.name()))]
    async fn send_email(
        &self,
        recipients: &[Email],
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), String> {
        if recipients.is_empty() {
            return Err("no recipients".to_string());
        }

        let url = self.base_url.join("email").map_err(|e| e.to_string())?;
        let rendered = templates::render(template).map_err(|e| e.to_string())?;
        let to = recipients
            .iter()
            .map(|email| email.as_ref().expose_secret().as_str())
            .collect::<Vec<_>>()
            .join(",");

        let request_body = SendEmailRequest {
            from: self.sender.as_ref().expose_secret(),
            to: &to,
            subject,
            html_body: &rendered.html_body,
            text_body: &rendered.text_body,
            message_stream: MESSAGE_STREAM,
        };

        self.http_client
            .post(url)
            .header(
                POSTMARK_AUTH_HEADER,
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}

const MESSAGE_STREAM: &str = "outbound";
const POSTMARK_AUTH_HEADER: &str = "X-Postmark-Server-Token";

#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    message_stream: &'a str,
}
