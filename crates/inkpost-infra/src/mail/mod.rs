//! Mail transports.
//!
//! [`LogMailer`] writes messages to the log and is used when no webhook is
//! configured. [`WebhookMailer`] posts each message as JSON to a mail relay.

use async_trait::async_trait;
use reqwest::StatusCode;

use inkpost_core::ports::{MailError, MailMessage, Mailer};

/// Development transport: every message becomes an `info` event.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            body = %message.body,
            "Mail sent"
        );
        Ok(())
    }
}

/// Posts messages to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct WebhookMailer {
    url: String,
    client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

/// Throttling and server errors are worth retrying; any other refusal is final.
fn relay_error(status: StatusCode, subject: &str) -> MailError {
    let reason = format!("relay answered {status} for '{subject}'");
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        MailError::Transport(reason)
    } else {
        MailError::Rejected(reason)
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(relay_error(status, &message.subject));
        }

        tracing::debug!(to = ?message.to, "Mail handed to relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_relay_is_a_transport_error() {
        for status in [
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::BAD_GATEWAY,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            assert!(
                matches!(relay_error(status, "New comment"), MailError::Transport(_)),
                "{status} should be retried"
            );
        }
    }

    #[test]
    fn test_refused_message_is_rejected() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNPROCESSABLE_ENTITY] {
            assert!(matches!(
                relay_error(status, "New comment"),
                MailError::Rejected(_)
            ));
        }
    }
}
