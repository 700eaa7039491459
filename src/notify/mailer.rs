//! Mail dispatcher — SMTP delivery via lettre.
//!
//! One outbound attempt per call, no batching, no queuing, no retries.
//! Each attempt is bounded by a timeout so a hung transport cannot stall
//! the scheduler's batch.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::error::DeliveryError;

/// SMTP configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    pub send_timeout: Duration,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (dispatch disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USER").unwrap_or_default();
        let password = std::env::var("SMTP_PASS").unwrap_or_default();
        let from_address = std::env::var("FROM_EMAIL").unwrap_or_else(|_| username.clone());

        let send_timeout_secs: u64 = std::env::var("SMTP_SEND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            from_address,
            send_timeout: Duration::from_secs(send_timeout_secs),
        })
    }
}

/// Outbound mail capability: exactly one send attempt per call.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), DeliveryError>;
}

/// SMTP-backed `MailTransport`.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn send_blocking(
        config: &SmtpConfig,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), DeliveryError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| DeliveryError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        let message = Message::builder()
            .from(config.from_address.parse().map_err(|e| {
                DeliveryError::InvalidAddress {
                    address: config.from_address.clone(),
                    reason: format!("{e}"),
                }
            })?)
            .to(to.parse().map_err(|e| DeliveryError::InvalidAddress {
                address: to.to_string(),
                reason: format!("{e}"),
            })?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))
            .map_err(|e| DeliveryError::BuildMessage(e.to_string()))?;

        transport
            .send(&message)
            .map_err(|e| DeliveryError::Transport(format!("SMTP send failed: {e}")))?;

        tracing::info!("Email sent to {to}");
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), DeliveryError> {
        let config = self.config.clone();
        let timeout = config.send_timeout;
        let to = to.to_string();
        let subject = subject.to_string();
        let text = text.to_string();
        let html = html.to_string();

        let handle = tokio::task::spawn_blocking(move || {
            Self::send_blocking(&config, &to, &subject, &text, &html)
        });

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(DeliveryError::Transport(format!("send task panicked: {e}"))),
            Err(_) => Err(DeliveryError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "user".into(),
            password: SecretString::from("pass".to_string()),
            from_address: "noreply@example.com".into(),
            send_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn send_rejects_invalid_recipient_before_any_io() {
        let mailer = SmtpMailer::new(test_config());
        let err = mailer
            .send("not-an-address", "subject", "text", "<p>html</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { address, .. } if address == "not-an-address"));
    }

    #[tokio::test]
    async fn send_rejects_invalid_from_address() {
        let mut config = test_config();
        config.from_address = "broken from".into();
        let mailer = SmtpMailer::new(config);
        let err = mailer
            .send("user@example.com", "subject", "text", "<p>html</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }));
    }

    #[test]
    fn multipart_message_builds_with_plain_and_html() {
        let message = Message::builder()
            .from("noreply@example.com".parse().unwrap())
            .to("user@example.com".parse().unwrap())
            .subject("🌱 Reminder: Water — Aloe")
            .multipart(MultiPart::alternative_plain_html(
                "Reminder: water for Aloe".to_string(),
                "<p>Water your Aloe</p>".to_string(),
            ));
        assert!(message.is_ok());
    }
}
