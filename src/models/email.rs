//! Plain-text email messages.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBJECT: &str = "Hello from AWS!";
pub const DEFAULT_BODY: &str = "Message body goes here";

/// A single plain-text message with one sender and one or more recipients.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Message with the default subject and body.
    pub fn greeting(from: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            from: from.into(),
            to,
            subject: DEFAULT_SUBJECT.into(),
            body: DEFAULT_BODY.into(),
        }
    }
}

/// Identifier the email service assigned to an accepted message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}
