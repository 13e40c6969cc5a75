//! Verification code delivery
//!
//! Codes go out through a transactional email HTTP API (Brevo's v3 send
//! endpoint by default). When no API key or sender is configured, codes
//! are written to the log instead so local signups still work.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_MAIL_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

/// Delivers verification codes to account owners
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<()>;
}

/// Mail configuration
#[derive(Debug, Clone, Default)]
pub struct MailerConfig {
    /// Send endpoint of the email API
    pub api_url: String,
    /// API key sent in the `api-key` header
    pub api_key: Option<String>,
    /// From address
    pub sender_email: Option<String>,
    /// Optional display name for the from address
    pub sender_name: Option<String>,
}

impl MailerConfig {
    /// Create a new MailerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MAIL_API_URL`: Send endpoint (default: Brevo v3 `smtp/email`)
    /// - `MAIL_API_KEY`: API key
    /// - `MAIL_SENDER_EMAIL`: From address
    /// - `MAIL_SENDER_NAME`: From display name
    pub fn from_env() -> Self {
        let non_empty = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        MailerConfig {
            api_url: non_empty("MAIL_API_URL").unwrap_or_else(|| DEFAULT_MAIL_API_URL.to_string()),
            api_key: non_empty("MAIL_API_KEY"),
            sender_email: non_empty("MAIL_SENDER_EMAIL"),
            sender_name: non_empty("MAIL_SENDER_NAME"),
        }
    }
}

/// Pick the HTTP mailer when credentials are present, the log otherwise
pub fn build_notifier(config: MailerConfig) -> Arc<dyn Notifier> {
    match (config.api_key, config.sender_email) {
        (Some(api_key), Some(sender_email)) => Arc::new(HttpMailer {
            client: reqwest::Client::new(),
            api_url: config.api_url,
            api_key,
            sender: EmailAddress {
                email: sender_email,
                name: config.sender_name,
            },
        }),
        _ => {
            warn!("MAIL_API_KEY or MAIL_SENDER_EMAIL not set, verification codes will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

fn verification_email(sender: &EmailAddress, to_email: &str, code: &str) -> SendEmailBody {
    SendEmailBody {
        sender: sender.clone(),
        to: vec![EmailAddress {
            email: to_email.to_string(),
            name: None,
        }],
        subject: "Email Verification Code".to_string(),
        html_content: format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
             <h2>Email Verification</h2>\
             <p>Use the following verification code to complete your registration:</p>\
             <h1 style=\"letter-spacing: 5px;\">{code}</h1>\
             <p>If you didn't request this code, please ignore this email.</p>\
             </div>"
        ),
        text_content: format!(
            "Your verification code is {code}.\n\nIf you didn't request this code, please ignore this email."
        ),
    }
}

/// Sends mail through a Brevo-compatible HTTP API
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: EmailAddress,
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<()> {
        let body = verification_email(&self.sender, email, code);

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API returned {}: {}", status, text);
        }

        info!("Verification code sent to {}", email);
        Ok(())
    }
}

/// Writes codes to the log instead of sending them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<()> {
        info!("Verification code {} issued for {}", code, email);
        Ok(())
    }
}
