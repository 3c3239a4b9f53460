//! Request DTOs for Web API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::validation::{no_control_chars, recipients_single_line, single_line};

/// Default page size for email listings.
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Maximum page size for email listings.
pub const MAX_PER_PAGE: u32 = 100;

/// Mailbox creation request.
///
/// With an `address` the mailbox is registered under that exact address.
/// Otherwise a random local part is generated, under `domain` if given.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateMailboxRequest {
    /// Full address to register.
    #[serde(default)]
    #[validate(
        length(min = 3, max = 254),
        custom(function = "single_line")
    )]
    pub address: Option<String>,
    /// Domain for a generated address.
    #[serde(default)]
    #[validate(length(min = 1, max = 253), custom(function = "single_line"))]
    pub domain: Option<String>,
}

/// Pagination query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationQuery {
    /// Normalized (page, per_page) with out-of-range values clamped.
    pub fn normalized(&self) -> (u32, u32) {
        (self.page.max(1), self.per_page.clamp(1, MAX_PER_PAGE))
    }

    /// Convert to (offset, limit).
    pub fn to_offset_limit(&self) -> (usize, usize) {
        let (page, per_page) = self.normalized();
        (
            (page as usize - 1) * per_page as usize,
            per_page as usize,
        )
    }
}

/// Query parameters for the rendered email view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderQuery {
    /// Show remote images instead of placeholders.
    #[serde(default)]
    pub show_images: bool,
}

/// Attachment metadata of an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InboundAttachment {
    /// File name.
    pub filename: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// Inbound message handed over by the mail receiver.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InboundEmailRequest {
    /// Sender address.
    #[validate(length(min = 1, max = 320), custom(function = "single_line"))]
    pub from: String,
    /// Recipient addresses.
    #[validate(length(min = 1, max = 50), custom(function = "recipients_single_line"))]
    pub to: Vec<String>,
    /// Subject line.
    #[serde(default)]
    #[validate(length(max = 998), custom(function = "single_line"))]
    pub subject: String,
    /// Date header (RFC 2822 or RFC 3339). Arrival time is used if absent or unparsable.
    #[serde(default)]
    pub date: Option<String>,
    /// Plain text body.
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub text: Option<String>,
    /// HTML body.
    #[serde(default)]
    pub html: Option<String>,
    /// Raw payload.
    #[serde(default)]
    pub body: Option<String>,
    /// Attachment metadata.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub attachments: Vec<InboundAttachment>,
}
