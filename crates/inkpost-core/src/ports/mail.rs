//! Outbound mail port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivers mail through some transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}
