use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::RwLock;
use verity_core::{Email, EmailClient, EmailTemplate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub template: EmailTemplate,
}

/// Keeps every message in memory instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct MockEmailClient {
    outbox: Arc<RwLock<Vec<SentEmail>>>,
}

impl MockEmailClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.outbox.read().await.clone()
    }

    /// Most recent message addressed to `recipient`.
    pub async fn last_sent_to(&self, recipient: &str) -> Option<SentEmail> {
        self.outbox
            .read()
            .await
            .iter()
            .rev()
            .find(|mail| mail.recipients.iter().any(|r| r == recipient))
            .cloned()
    }
}

#[async_trait::async_trait]
impl EmailClient for MockEmailClient {
    #[tracing::instrument(name = "Recording email", skip_all)]
    async fn send_email(
        &self,
        recipients: &[Email],
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), String> {
        self.outbox.write().await.push(SentEmail {
            recipients: recipients
                .iter()
                .map(|email| email.as_ref().expose_secret().clone())
                .collect(),
            subject: subject.to_string(),
            template: template.clone(),
        });
        Ok(())
    }
}
