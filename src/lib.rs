//! tempmail - disposable mailbox service
//!
//! Issues throwaway addresses under a configured set of domains, stores the
//! mail delivered to them, and forgets both once the mailbox expires.

pub mod app;
pub mod config;
pub mod datetime;
pub mod error;
pub mod kv;
pub mod logging;
pub mod mail;
pub mod render;
pub mod web;

pub use app::{build_service, build_service_with};
pub use config::Config;
pub use datetime::{Clock, ManualClock, SystemClock};
pub use error::{Result, TempMailError};
pub use kv::{KeyValueStore, MemoryStore};
pub use mail::{
    Address, Attachment, Email, MailStore, Mailbox, MailboxLocks, MailboxPolicy, MailboxService,
    MessageContent, NewEmail,
};
pub use render::{render, preview_of, DisplayContent, RenderOptions};
pub use web::WebServer;
