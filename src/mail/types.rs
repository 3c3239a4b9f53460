//! Mail types for tempmail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A disposable mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Normalized address (`local@domain`).
    pub address: String,
    /// When the current lifetime started.
    pub created_at: DateTime<Utc>,
    /// When the mailbox stops accepting and serving mail.
    pub expires_at: DateTime<Utc>,
    /// False once deactivated or observed expired.
    pub active: bool,
}

impl Mailbox {
    /// Check if the mailbox is usable at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }

    /// Check if the mailbox is still flagged active but past its expiry.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && now >= self.expires_at
    }
}

/// Attachment metadata. Attachment bodies are not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as announced by the sender.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

/// Displayable body of a message.
///
/// The variant is picked once, when the message is built, with priority
/// HTML, then plain text, then the raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    /// Rendered HTML body.
    Html(String),
    /// Plain text body.
    Text(String),
    /// Raw RFC 822 style payload, possibly multipart.
    Raw(String),
    /// Nothing to show.
    Empty,
}

impl MessageContent {
    /// Pick the content variant from the optional parts of an inbound message.
    ///
    /// Blank parts count as absent.
    pub fn from_parts(html: Option<String>, text: Option<String>, body: Option<String>) -> Self {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());

        if present(&html) {
            MessageContent::Html(html.unwrap_or_default())
        } else if present(&text) {
            MessageContent::Text(text.unwrap_or_default())
        } else if present(&body) {
            MessageContent::Raw(body.unwrap_or_default())
        } else {
            MessageContent::Empty
        }
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::Html(_) => "html",
            MessageContent::Text(_) => "text",
            MessageContent::Raw(_) => "raw",
            MessageContent::Empty => "empty",
        }
    }

    /// Check if there is nothing to show.
    pub fn is_empty(&self) -> bool {
        matches!(self, MessageContent::Empty)
    }
}

/// A stored email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Opaque id, unique within the owning mailbox.
    pub id: String,
    /// Sender.
    pub from: String,
    /// Recipient mailbox address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Message date (sender supplied, or arrival time).
    pub date: DateTime<Utc>,
    /// Body.
    pub content: MessageContent,
    /// Attachment metadata in message order.
    pub attachments: Vec<Attachment>,
}

/// Email as delivered, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmail {
    /// Sender.
    pub from: String,
    /// Recipient mailbox address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Sender supplied date, if any.
    pub date: Option<DateTime<Utc>>,
    /// Body.
    pub content: MessageContent,
    /// Attachment metadata.
    pub attachments: Vec<Attachment>,
}

impl NewEmail {
    /// Create a new email with no date and no attachments.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        content: MessageContent,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            date: None,
            content,
            attachments: Vec::new(),
        }
    }

    /// Set the message date.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Add attachment metadata.
    pub fn with_attachment(mut self, filename: impl Into<String>, size: u64) -> Self {
        self.attachments.push(Attachment {
            filename: filename.into(),
            size,
        });
        self
    }

    /// Turn into a stored email, stamping `received_at` when no date was given.
    pub fn into_email(self, id: String, received_at: DateTime<Utc>) -> Email {
        Email {
            id,
            from: self.from,
            to: self.to,
            subject: self.subject,
            date: self.date.unwrap_or(received_at),
            content: self.content,
            attachments: self.attachments,
        }
    }
}
