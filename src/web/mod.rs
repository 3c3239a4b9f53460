//! Web API module for tempmail.
//!
//! This module provides the REST API browsers use to create mailboxes and
//! read mail, plus the inbound endpoint the mail receiver delivers to.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_app, create_router};
pub use server::WebServer;
