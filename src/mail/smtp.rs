use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{DeliveryError, EmailMessage, EmailSender};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Connection settings for an authenticated SMTP relay.
///
/// The authenticated user doubles as the envelope sender address.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub from_name: String,
}

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
    port: u16,
}

impl SmtpEmailSender {
    /// Build a pooled STARTTLS transport. No connection is opened until the
    /// first send or [`SmtpEmailSender::check`].
    ///
    /// # Errors
    /// Returns an error if the relay host or the sender address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let address: Address = config
            .user
            .parse()
            .with_context(|| format!("SMTP user is not an email address: {}", config.user))?;
        let credentials = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("Invalid SMTP relay host: {}", config.host))?
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from: Mailbox::new(Some(config.from_name.clone()), address),
            host: config.host.clone(),
            port: config.port,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Open a connection, authenticate and say goodbye.
    ///
    /// # Errors
    /// Returns [`DeliveryError::Transport`] when the server is unreachable or
    /// rejects the handshake.
    #[instrument(skip(self), fields(smtp.host = %self.host, smtp.port = self.port))]
    pub async fn check(&self) -> Result<(), DeliveryError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DeliveryError::Transport(
                "server did not accept the connection test".to_string(),
            )),
            Err(err) => Err(DeliveryError::Transport(err.to_string())),
        }
    }

    /// `Message-ID` header value, scoped to the sender's domain.
    fn next_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    #[instrument(skip(self, message), fields(smtp.host = %self.host))]
    async fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|err: lettre::address::AddressError| DeliveryError::Address {
                address: message.to.clone(),
                reason: err.to_string(),
            })?;

        let message_id = self.next_message_id();
        let email = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|err| DeliveryError::Message(err.to_string()))?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        debug!(code = %response.code(), %message_id, "SMTP accepted message");
        Ok(message_id)
    }
}
