//! Mailbox lifecycle service.
//!
//! This module gates every mailbox operation on the configured domains and
//! on mailbox expiry, and logs lifecycle events.

use std::time::Duration;

use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::config::MailConfig;
use crate::{Result, TempMailError};

use super::address::{generate_local_part, Address};
use super::store::MailStore;
use super::types::{Email, Mailbox, NewEmail};

/// Attempts at finding an unused random address before giving up.
const GENERATE_ATTEMPTS: usize = 16;

/// Lifetimes and limits applied to mailboxes.
#[derive(Debug, Clone)]
pub struct MailboxPolicy {
    /// Lifetime of a newly registered mailbox.
    pub expiration: Duration,
    /// Lifetime granted by a refresh.
    pub extension: Duration,
    /// Length of generated local parts.
    pub local_part_length: usize,
    /// Maximum preview length in characters.
    pub preview_length: usize,
}

impl From<&MailConfig> for MailboxPolicy {
    fn from(config: &MailConfig) -> Self {
        Self {
            expiration: config.expiration(),
            extension: config.extension(),
            local_part_length: config.local_part_length,
            preview_length: config.preview_length,
        }
    }
}

impl Default for MailboxPolicy {
    fn default() -> Self {
        Self::from(&MailConfig::default())
    }
}

/// Service for mailbox and email operations.
pub struct MailboxService {
    store: MailStore,
    policy: MailboxPolicy,
}

impl MailboxService {
    /// Create a new service over a store.
    pub fn new(store: MailStore, policy: MailboxPolicy) -> Self {
        Self { store, policy }
    }

    /// The policy in effect.
    pub fn policy(&self) -> &MailboxPolicy {
        &self.policy
    }

    /// The underlying store.
    pub fn store(&self) -> &MailStore {
        &self.store
    }

    /// Configured domains, sorted.
    pub async fn domains(&self) -> Result<Vec<String>> {
        Ok(self.store.get_domains().await?.into_iter().collect())
    }

    /// Register a mailbox, or refresh it if it already exists and is live.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The address is malformed
    /// - The domain is not configured
    pub async fn register_mailbox(&self, address: &str) -> Result<Mailbox> {
        let address = Address::parse(address)?;
        if !self.store.is_domain_valid(address.domain()).await? {
            return Err(TempMailError::InvalidDomain(address.domain().to_string()));
        }

        let mailbox = self
            .store
            .upsert_mailbox(&address.to_string(), self.policy.expiration)
            .await?;
        info!(
            address = %mailbox.address,
            expires_at = %mailbox.expires_at,
            "mailbox registered"
        );
        Ok(mailbox)
    }

    /// Register a mailbox under a random local part.
    ///
    /// Uses `domain` if given, otherwise a random configured domain.
    pub async fn generate_mailbox(&self, domain: Option<&str>) -> Result<Mailbox> {
        let domain = match domain {
            Some(domain) => {
                let domain = domain.trim().to_lowercase();
                if !self.store.is_domain_valid(&domain).await? {
                    return Err(TempMailError::InvalidDomain(domain));
                }
                domain
            }
            None => {
                let domains = self.domains().await?;
                domains
                    .choose(&mut rand::rng())
                    .cloned()
                    .ok_or_else(|| TempMailError::Config("no domains configured".to_string()))?
            }
        };

        let now = self.store.now();
        for _ in 0..GENERATE_ATTEMPTS {
            let local = generate_local_part(self.policy.local_part_length);
            let address = Address::from_parts(&local, &domain)?.to_string();
            let taken = self
                .store
                .get_mailbox(&address)
                .await?
                .is_some_and(|m| m.is_live(now));
            if !taken {
                return self.register_mailbox(&address).await;
            }
            debug!(address = %address, "generated address already in use");
        }

        warn!(domain = %domain, "could not find a free address");
        Err(TempMailError::AddressExhausted(domain))
    }

    /// Check whether a mailbox exists, is active and has not expired.
    ///
    /// A mailbox observed past its expiry is retired here and its emails are
    /// deleted. Malformed addresses are simply not active.
    pub async fn is_mailbox_active(&self, address: &str) -> Result<bool> {
        let Ok(address) = Address::parse(address) else {
            return Ok(false);
        };
        let address = address.to_string();

        if self.store.expire_if_due(&address).await? {
            info!(address = %address, "mailbox expired");
            return Ok(false);
        }
        let now = self.store.now();
        Ok(self
            .store
            .get_mailbox(&address)
            .await?
            .is_some_and(|m| m.is_live(now)))
    }

    /// Get a live mailbox.
    pub async fn mailbox(&self, address: &str) -> Result<Mailbox> {
        let address = self.known_address(address)?;
        if self.store.expire_if_due(&address).await? {
            info!(address = %address, "mailbox expired");
        }
        let now = self.store.now();
        self.store
            .get_mailbox(&address)
            .await?
            .filter(|m| m.is_live(now))
            .ok_or(TempMailError::UnknownMailbox(address))
    }

    /// Extend a live mailbox's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TempMailError::UnknownMailbox`] if the mailbox is missing,
    /// deactivated or expired.
    pub async fn refresh_mailbox(&self, address: &str) -> Result<Mailbox> {
        let address = self.known_address(address)?;
        let mailbox = self
            .store
            .extend_mailbox(&address, self.policy.extension)
            .await?;
        info!(
            address = %address,
            expires_at = %mailbox.expires_at,
            "mailbox refreshed"
        );
        Ok(mailbox)
    }

    /// Deactivate a mailbox and delete its emails.
    ///
    /// Returns true if the mailbox was active. Idempotent.
    pub async fn deactivate_mailbox(&self, address: &str) -> Result<bool> {
        let Ok(address) = Address::parse(address) else {
            return Ok(false);
        };
        let address = address.to_string();
        let deactivated = self.store.deactivate_mailbox(&address).await?;
        if deactivated {
            info!(address = %address, "mailbox deactivated");
        }
        Ok(deactivated)
    }

    /// Emails of a live mailbox, newest first.
    pub async fn list_emails(&self, address: &str) -> Result<Vec<Email>> {
        let address = self.known_address(address)?;
        self.store.get_emails(&address).await
    }

    /// One email of a live mailbox.
    pub async fn get_email(&self, address: &str, id: &str) -> Result<Email> {
        let address = self.known_address(address)?;
        self.store.get_email_by_id(&address, id).await
    }

    /// Delete one email. Returns true if it existed.
    pub async fn delete_email(&self, address: &str, id: &str) -> Result<bool> {
        let address = self.known_address(address)?;
        let deleted = self.store.delete_email(&address, id).await?;
        if deleted {
            debug!(address = %address, id, "email deleted");
        }
        Ok(deleted)
    }

    /// Delete every email of a live mailbox. Returns true if any existed.
    pub async fn delete_all_emails(&self, address: &str) -> Result<bool> {
        let address = self.known_address(address)?;
        let deleted = self.store.delete_all_emails(&address).await?;
        if deleted {
            debug!(address = %address, "all emails deleted");
        }
        Ok(deleted)
    }

    /// Deliver an inbound email to its recipient mailbox.
    ///
    /// Returns the id assigned to the stored email.
    pub async fn deliver(&self, mut email: NewEmail) -> Result<String> {
        let address = self.known_address(&email.to)?;
        email.to = address.clone();
        let from = email.from.clone();
        let id = self.store.store_email(&address, email).await?;
        info!(address = %address, from = %from, id = %id, "email delivered");
        Ok(id)
    }

    /// Retire expired mailboxes. Returns how many were retired.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let retired = self.store.sweep().await?;
        if retired > 0 {
            info!(retired, "expired mailboxes swept");
        }
        Ok(retired)
    }

    /// Normalize an address that must name an existing mailbox.
    fn known_address(&self, address: &str) -> Result<String> {
        Address::parse(address)
            .map(|a| a.to_string())
            .map_err(|_| TempMailError::UnknownMailbox(address.trim().to_string()))
    }
}
