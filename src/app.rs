//! Application wiring: builds the mail service from configuration.

use std::sync::Arc;

use crate::config::Config;
use crate::datetime::{Clock, SystemClock};
use crate::kv::{KeyValueStore, MemoryStore};
use crate::mail::{MailStore, MailboxLocks, MailboxPolicy, MailboxService};
use crate::Result;

/// Build the mailbox service over an in-process store and the wall clock.
pub async fn build_service(config: &Config) -> Result<Arc<MailboxService>> {
    let kv = Arc::new(MemoryStore::with_timeout(config.store.timeout()));
    build_service_with(config, kv, Arc::new(SystemClock)).await
}

/// Build the mailbox service over a given store and clock.
///
/// The configured domains are loaded into the store.
pub async fn build_service_with(
    config: &Config,
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<MailboxService>> {
    let locks = MailboxLocks::new(config.store.lock_stripes, config.store.timeout());
    let store = MailStore::new(kv, locks, clock);
    store.initialize_domains(&config.mail.domains).await?;

    tracing::info!(domains = ?config.mail.domains, "Mail domains initialized");

    Ok(Arc::new(MailboxService::new(
        store,
        MailboxPolicy::from(&config.mail),
    )))
}
