use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use palmera_store::app_config::EmailConfig;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends one HTML email and reports plain success or failure. Implementations
/// log the reason for a failure themselves; callers only branch on the bool.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("invalid sender address: {0}")]
    InvalidSender(#[from] lettre::address::AddressError),
    #[error("smtp transport setup failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Pooled SMTP mailer over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        let from: Mailbox =
            format!("{} <{}>", config.from_name, config.from_address).parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .pool_config(PoolConfig::new().max_size(4))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> bool {
        let recipient: Mailbox = match to.parse() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                warn!(recipient = to, error = %err, "skipping email, recipient address is invalid");
                return false;
            }
        };

        let message = match Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
        {
            Ok(message) => message,
            Err(err) => {
                warn!(recipient = to, error = %err, "failed to assemble email");
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                debug!(recipient = to, subject, "email accepted by smtp relay");
                true
            }
            Err(err) => {
                warn!(recipient = to, error = %err, "email delivery failed");
                false
            }
        }
    }
}
