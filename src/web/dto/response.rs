//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::seconds_until;
use crate::mail::{Attachment, Email, Mailbox, MessageContent};
use crate::render::{preview_of, DisplayContent};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Create a new paginated response.
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
}

// ============================================================================
// Mailbox DTOs
// ============================================================================

/// Mailbox response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MailboxResponse {
    /// Mailbox address.
    pub address: String,
    /// Start of the current lifetime.
    pub created_at: String,
    /// Expiry timestamp.
    pub expires_at: String,
    /// Seconds left before expiry.
    pub expires_in: u64,
    /// Whether the mailbox is active.
    pub active: bool,
}

impl MailboxResponse {
    /// Build from a mailbox as seen at `now`.
    pub fn from_mailbox(mailbox: &Mailbox, now: DateTime<Utc>) -> Self {
        Self {
            address: mailbox.address.clone(),
            created_at: mailbox.created_at.to_rfc3339(),
            expires_at: mailbox.expires_at.to_rfc3339(),
            expires_in: seconds_until(now, mailbox.expires_at),
            active: mailbox.is_live(now),
        }
    }
}

/// Configured domains.
#[derive(Debug, Serialize, ToSchema)]
pub struct DomainListResponse {
    /// Domains addresses can be created under.
    pub domains: Vec<String>,
}

/// Result of a delete operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// True if something was removed.
    pub deleted: bool,
}

// ============================================================================
// Email DTOs
// ============================================================================

/// Attachment metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttachmentResponse {
    /// File name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

impl From<&Attachment> for AttachmentResponse {
    fn from(attachment: &Attachment) -> Self {
        Self {
            filename: attachment.filename.clone(),
            size: attachment.size,
        }
    }
}

/// Email list item response.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmailSummaryResponse {
    /// Email ID.
    pub id: String,
    /// Sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Subject.
    pub subject: String,
    /// Message date.
    pub date: String,
    /// Short excerpt of the body.
    pub preview: String,
    /// Body kind (html, text, raw or empty).
    pub content_type: String,
    /// Number of attachments.
    pub attachment_count: usize,
}

impl EmailSummaryResponse {
    /// Build from an email, computing its preview.
    pub fn from_email(email: &Email, preview_length: usize) -> Self {
        Self {
            id: email.id.clone(),
            from: email.from.clone(),
            to: email.to.clone(),
            subject: email.subject.clone(),
            date: email.date.to_rfc3339(),
            preview: preview_of(&email.content, preview_length),
            content_type: email.content.kind().to_string(),
            attachment_count: email.attachments.len(),
        }
    }
}

/// Email detail response.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmailDetailResponse {
    /// Email ID.
    pub id: String,
    /// Sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Subject.
    pub subject: String,
    /// Message date.
    pub date: String,
    /// Body kind (html, text, raw or empty).
    pub content_type: String,
    /// Plain text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// HTML body, unsanitized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Raw payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Short excerpt of the body.
    pub preview: String,
    /// Attachment metadata.
    pub attachments: Vec<AttachmentResponse>,
}

impl EmailDetailResponse {
    /// Build from an email, computing its preview.
    pub fn from_email(email: &Email, preview_length: usize) -> Self {
        let (text, html, body) = match &email.content {
            MessageContent::Html(html) => (None, Some(html.clone()), None),
            MessageContent::Text(text) => (Some(text.clone()), None, None),
            MessageContent::Raw(body) => (None, None, Some(body.clone())),
            MessageContent::Empty => (None, None, None),
        };
        Self {
            id: email.id.clone(),
            from: email.from.clone(),
            to: email.to.clone(),
            subject: email.subject.clone(),
            date: email.date.to_rfc3339(),
            content_type: email.content.kind().to_string(),
            text,
            html,
            body,
            preview: preview_of(&email.content, preview_length),
            attachments: email.attachments.iter().map(Into::into).collect(),
        }
    }
}

/// Rendered email response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RenderedEmailResponse {
    /// Email ID.
    pub id: String,
    /// Subject.
    pub subject: String,
    /// Whether images were shown.
    pub show_images: bool,
    /// Structured display content.
    #[schema(value_type = Object)]
    pub content: DisplayContent,
    /// Display content as an HTML fragment.
    pub html: String,
}

// ============================================================================
// Inbound DTOs
// ============================================================================

/// A recipient the message was stored for.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveredRecipient {
    /// Recipient address.
    pub recipient: String,
    /// Assigned email ID.
    pub id: String,
}

/// A recipient the message could not be stored for.
#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedRecipient {
    /// Recipient address as given.
    pub recipient: String,
    /// Reason.
    pub reason: String,
}

/// Inbound delivery result.
#[derive(Debug, Serialize, ToSchema)]
pub struct InboundResponse {
    /// Successful deliveries.
    pub delivered: Vec<DeliveredRecipient>,
    /// Rejected recipients.
    pub rejected: Vec<RejectedRecipient>,
}

// ============================================================================
// Config DTOs
// ============================================================================

/// Public service configuration.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicConfigResponse {
    /// Domains addresses can be created under.
    pub domains: Vec<String>,
    /// Lifetime of a new mailbox in seconds.
    pub expiration_secs: u64,
    /// Lifetime granted by a refresh in seconds.
    pub extension_secs: u64,
    /// Maximum preview length in characters.
    pub preview_length: usize,
}
