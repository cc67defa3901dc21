//! Outbound email for verification codes.
//!
//! The OTP service hands a rendered [`EmailMessage`] to an [`EmailSender`] and
//! gets back a delivery identifier or a [`DeliveryError`]. Two senders ship:
//!
//! - [`SmtpEmailSender`] relays through an authenticated SMTP server (STARTTLS).
//! - [`LogEmailSender`] only logs; it is wired in when no SMTP credentials are
//!   configured. It always reports [`DeliveryError::NotConfigured`], so the
//!   delivery policy decides whether issuing degrades or fails.
//!
//! Senders never retry. A "resend code" in the UI is a fresh issue request.

mod smtp;
mod template;

pub use smtp::{SmtpConfig, SmtpEmailSender, DEFAULT_SMTP_HOST};
pub use template::{Branding, DEFAULT_PRODUCT_NAME, DEFAULT_SUPPORT_EMAIL};

use async_trait::async_trait;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
    #[error("SMTP configuration missing")]
    NotConfigured,
}

/// Email delivery capability injected into the OTP service.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message, returning the transport's message identifier.
    async fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError>;
}

/// Stand-in used when no relay is configured: logs the envelope, sends nothing.
#[derive(Clone, Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email not sent, no SMTP transport configured"
        );
        Err(DeliveryError::NotConfigured)
    }
}
