//! Mail module for tempmail.
//!
//! This module provides the disposable mailbox functionality:
//! - Domain registry and address validation
//! - Mailbox registration, refresh, deactivation and expiry
//! - Email storage, retrieval and deletion per mailbox

mod address;
mod lock;
mod service;
mod store;
mod types;

pub use address::{generate_local_part, Address, MAX_LOCAL_PART_LENGTH};
pub use lock::MailboxLocks;
pub use service::{MailboxPolicy, MailboxService};
pub use store::{MailStore, INACTIVE_RETENTION};
pub use types::{Attachment, Email, Mailbox, MessageContent, NewEmail};
