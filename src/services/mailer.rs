//! Sending plain-text email through a hosted email service.

use crate::models::email::{EmailMessage, SendReceipt};
use async_trait::async_trait;
use aws_sdk_sesv2::{
    error::DisplayErrorContext,
    types::{Body, Content, Destination, EmailContent, Message},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("message has no sender address")]
    MissingSender,
    #[error("message has no recipients")]
    NoRecipients,
    #[error("recipient list contains a blank address")]
    BlankRecipient,
    #[error("could not build message: {0}")]
    Build(String),
    #[error("send failed: {0}")]
    Send(String),
}

impl EmailMessage {
    /// Reject messages the service would bounce before any call is made.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.from.trim().is_empty() {
            return Err(MailError::MissingSender);
        }
        if self.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        if self.to.iter().any(|addr| addr.trim().is_empty()) {
            return Err(MailError::BlankRecipient);
        }
        Ok(())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError>;
}

/// `Mailer` backed by Amazon SES (v2 API).
#[derive(Clone)]
pub struct SesMailer {
    client: aws_sdk_sesv2::Client,
}

impl SesMailer {
    pub fn new(client: aws_sdk_sesv2::Client) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_sesv2::Client::new(&config))
    }
}

fn utf8_content(data: &str) -> Result<Content, MailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|err| MailError::Build(err.to_string()))
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt, MailError> {
        message.validate()?;

        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .build();
        let body = Body::builder().text(utf8_content(&message.body)?).build();
        let simple = Message::builder()
            .subject(utf8_content(&message.subject)?)
            .body(body)
            .build();
        let content = EmailContent::builder().simple(simple).build();

        let output = self
            .client
            .send_email()
            .from_email_address(&message.from)
            .destination(destination)
            .content(content)
            .send()
            .await
            .map_err(|err| MailError::Send(DisplayErrorContext(&err).to_string()))?;

        let receipt = SendReceipt {
            message_id: output.message_id().map(str::to_string),
        };
        info!(
            from = %message.from,
            recipients = message.to.len(),
            message_id = receipt.message_id.as_deref().unwrap_or(""),
            "email accepted"
        );
        Ok(receipt)
    }
}
