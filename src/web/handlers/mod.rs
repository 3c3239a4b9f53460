//! API handlers for the tempmail web API.

pub mod config;
pub mod email;
pub mod inbound;
pub mod mailbox;

pub use config::*;
pub use email::*;
pub use inbound::*;
pub use mailbox::*;

use std::sync::Arc;

use crate::config::MailConfig;
use crate::mail::MailboxService;

/// Shared state of the API handlers.
pub struct AppState {
    /// Mailbox service.
    pub service: Arc<MailboxService>,
    /// Mailbox policy as configured.
    pub mail_config: MailConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: Arc<MailboxService>, mail_config: MailConfig) -> Self {
        Self {
            service,
            mail_config,
        }
    }

    /// Preview length for listings.
    pub fn preview_length(&self) -> usize {
        self.service.policy().preview_length
    }
}
