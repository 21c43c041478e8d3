use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Errors that can occur on the email channel
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mailer API returned error: {0}")]
    Api(String),
}

/// Best-effort delivery of a formatted message to an external address
#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send_email(
        &self,
        to_address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), EmailError>;
}

/// HTTP client for the transactional mail provider
pub struct HttpMailer {
    endpoint: String,
    api_key: String,
    sender: String,
    client: Client,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: String, sender: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            sender,
            client,
        }
    }
}

#[async_trait]
impl EmailChannel for HttpMailer {
    async fn send_email(
        &self,
        to_address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/messages", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&serde_json::json!({
                "from": self.sender,
                "to": to_address,
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmailError::Api(format!(
                "Failed to send email: {}",
                response.status()
            )));
        }

        tracing::debug!(to = to_address, subject, "Email accepted by mailer");

        Ok(())
    }
}
