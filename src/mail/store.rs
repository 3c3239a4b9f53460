//! Key-value backed mail store.
//!
//! Key layout:
//!
//! | Key                     | Type | Content                                  |
//! |-------------------------|------|------------------------------------------|
//! | `domains`               | set  | configured domains                       |
//! | `mailbox:{address}`     | hash | `address`, `created_at`, `expires_at`, `active` |
//! | `emails:{address}`      | list | email ids in arrival order               |
//! | `email:{address}:{id}`  | str  | JSON encoded [`Email`]                   |
//!
//! Every operation on a mailbox runs under that mailbox's lock, so
//! concurrent deliveries and deletes against one address are serialized.
//! Writes are ordered so that an abandoned operation leaves nothing a reader
//! could observe half-applied: an email document is written before its id is
//! listed, and a mailbox is flagged inactive before its emails are removed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::datetime::{add_duration, Clock};
use crate::kv::KeyValueStore;
use crate::{Result, TempMailError};

use super::lock::MailboxLocks;
use super::types::{Email, Mailbox, NewEmail};

const DOMAINS_KEY: &str = "domains";

/// How long a deactivated mailbox record is kept before the store reclaims it.
pub const INACTIVE_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

fn mailbox_key(address: &str) -> String {
    format!("mailbox:{address}")
}

fn emails_key(address: &str) -> String {
    format!("emails:{address}")
}

fn email_key(address: &str, id: &str) -> String {
    format!("email:{address}:{id}")
}

/// Registry of domains, mailboxes and their emails.
///
/// Addresses passed to the store are expected to be normalized already.
pub struct MailStore {
    kv: Arc<dyn KeyValueStore>,
    locks: MailboxLocks,
    clock: Arc<dyn Clock>,
}

impl MailStore {
    /// Create a store over a key-value backend.
    pub fn new(kv: Arc<dyn KeyValueStore>, locks: MailboxLocks, clock: Arc<dyn Clock>) -> Self {
        Self { kv, locks, clock }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Domains
    // ------------------------------------------------------------------

    /// Replace the configured domain set.
    pub async fn initialize_domains<I, S>(&self, domains: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _guard = self.locks.lock(DOMAINS_KEY).await?;
        self.kv.del(&[DOMAINS_KEY]).await?;
        for domain in domains {
            let domain = domain.as_ref().trim().to_lowercase();
            if !domain.is_empty() {
                self.kv.sadd(DOMAINS_KEY, &domain).await?;
            }
        }
        Ok(())
    }

    /// Configured domains, sorted.
    pub async fn get_domains(&self) -> Result<BTreeSet<String>> {
        Ok(self.kv.smembers(DOMAINS_KEY).await?.into_iter().collect())
    }

    /// Check whether a domain is configured.
    pub async fn is_domain_valid(&self, domain: &str) -> Result<bool> {
        self.kv
            .sismember(DOMAINS_KEY, &domain.trim().to_lowercase())
            .await
    }

    // ------------------------------------------------------------------
    // Mailboxes
    // ------------------------------------------------------------------

    /// Read a mailbox record as stored, without evaluating expiry.
    pub async fn get_mailbox(&self, address: &str) -> Result<Option<Mailbox>> {
        let fields = self.kv.hgetall(&mailbox_key(address)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode_mailbox(address, &fields).map(Some)
    }

    /// Create a mailbox, or refresh it if it is already live.
    ///
    /// A live mailbox keeps its creation time and its expiry only ever moves
    /// forward. A missing, deactivated or lapsed mailbox starts a new lifetime
    /// with no emails.
    pub async fn upsert_mailbox(&self, address: &str, lifetime: Duration) -> Result<Mailbox> {
        let _guard = self.locks.lock(address).await?;
        let now = self.now();
        let deadline = add_duration(now, lifetime);

        if let Some(mut mailbox) = self.get_mailbox(address).await? {
            if mailbox.is_live(now) {
                if deadline > mailbox.expires_at {
                    mailbox.expires_at = deadline;
                    self.write_expiry(&mailbox).await?;
                }
                return Ok(mailbox);
            }
            if mailbox.active {
                self.retire(address).await?;
            }
            // Drop the retention TTL along with the old record.
            self.kv.del(&[&mailbox_key(address)]).await?;
            self.clear_emails(address).await?;
        }

        let mailbox = Mailbox {
            address: address.to_string(),
            created_at: now,
            expires_at: deadline,
            active: true,
        };
        let created_at = mailbox.created_at.to_rfc3339();
        let expires_at = mailbox.expires_at.to_rfc3339();
        self.kv
            .hset(
                &mailbox_key(address),
                &[
                    ("address", address),
                    ("created_at", &created_at),
                    ("expires_at", &expires_at),
                    ("active", "true"),
                ],
            )
            .await?;
        debug!(address, expires_at = %mailbox.expires_at, "mailbox created");
        Ok(mailbox)
    }

    /// Push a live mailbox's expiry to at least `now + extension`.
    ///
    /// # Errors
    ///
    /// Returns [`TempMailError::UnknownMailbox`] if the mailbox is missing,
    /// deactivated or lapsed.
    pub async fn extend_mailbox(&self, address: &str, extension: Duration) -> Result<Mailbox> {
        let _guard = self.locks.lock(address).await?;
        let mut mailbox = self.live_mailbox(address).await?;
        let deadline = add_duration(self.now(), extension);
        if deadline > mailbox.expires_at {
            mailbox.expires_at = deadline;
            self.write_expiry(&mailbox).await?;
        }
        Ok(mailbox)
    }

    /// Deactivate a mailbox and delete its emails.
    ///
    /// Returns true if the mailbox was active. Deactivating a missing or
    /// inactive mailbox is a no-op.
    pub async fn deactivate_mailbox(&self, address: &str) -> Result<bool> {
        let _guard = self.locks.lock(address).await?;
        match self.get_mailbox(address).await? {
            Some(mailbox) if mailbox.active => {
                self.retire(address).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Retire the mailbox if it is flagged active but past its expiry.
    ///
    /// Returns true if it was retired by this call.
    pub async fn expire_if_due(&self, address: &str) -> Result<bool> {
        let _guard = self.locks.lock(address).await?;
        match self.get_mailbox(address).await? {
            Some(mailbox) if mailbox.is_due(self.now()) => {
                self.retire(address).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Addresses of every stored mailbox record.
    pub async fn mailbox_addresses(&self) -> Result<Vec<String>> {
        let keys = self.kv.keys("mailbox:*").await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix("mailbox:").map(str::to_string))
            .collect())
    }

    /// Reclaim lapsed mailboxes, orphaned email lists and unlisted documents.
    ///
    /// Returns the number of mailboxes retired.
    pub async fn sweep(&self) -> Result<usize> {
        let mut addresses: BTreeSet<String> = self.mailbox_addresses().await?.into_iter().collect();
        addresses.extend(
            self.kv
                .keys("emails:*")
                .await?
                .into_iter()
                .filter_map(|k| k.strip_prefix("emails:").map(str::to_string)),
        );

        // Documents by owning address, so unlisted ones can be reclaimed.
        let mut documents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in self.kv.keys("email:*").await? {
            if let Some((address, _)) = key
                .strip_prefix("email:")
                .and_then(|rest| rest.rsplit_once(':'))
            {
                documents.entry(address.to_string()).or_default().push(key.clone());
            }
        }
        addresses.extend(documents.keys().cloned());

        let mut retired = 0;
        for address in addresses {
            let _guard = self.locks.lock(&address).await?;
            let now = self.now();
            let live = match self.get_mailbox(&address).await? {
                Some(mailbox) if mailbox.is_due(now) => {
                    self.retire(&address).await?;
                    retired += 1;
                    false
                }
                Some(mailbox) => mailbox.is_live(now),
                None => false,
            };
            if live {
                continue;
            }
            if self.clear_emails(&address).await? {
                debug!(address = %address, "removed orphaned emails");
            }
            if let Some(keys) = documents.get(&address) {
                let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
                let removed = self.kv.del(&refs).await?;
                if removed > 0 {
                    debug!(address = %address, removed, "removed unlisted email documents");
                }
            }
        }
        Ok(retired)
    }

    // ------------------------------------------------------------------
    // Emails
    // ------------------------------------------------------------------

    /// Store an email in a live mailbox and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`TempMailError::UnknownMailbox`] if the mailbox is missing,
    /// deactivated or lapsed.
    pub async fn store_email(&self, address: &str, email: NewEmail) -> Result<String> {
        let _guard = self.locks.lock(address).await?;
        self.live_mailbox(address).await?;

        let id = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if !self.kv.exists(&email_key(address, &candidate)).await? {
                break candidate;
            }
        };

        let email = email.into_email(id.clone(), self.now());
        let document = serde_json::to_string(&email)?;
        self.kv.set(&email_key(address, &id), &document).await?;
        self.kv.rpush(&emails_key(address), &id).await?;
        Ok(id)
    }

    /// Emails of a live mailbox, newest first.
    pub async fn get_emails(&self, address: &str) -> Result<Vec<Email>> {
        let _guard = self.locks.lock(address).await?;
        self.live_mailbox(address).await?;

        let ids = self.kv.lrange(&emails_key(address), 0, -1).await?;
        let mut emails = Vec::with_capacity(ids.len());
        for id in ids.iter().rev() {
            match self.kv.get(&email_key(address, id)).await? {
                Some(document) => emails.push(serde_json::from_str(&document)?),
                None => warn!(address, id = %id, "listed email has no document"),
            }
        }
        Ok(emails)
    }

    /// One email of a live mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`TempMailError::NotFound`] if the mailbox has no such email.
    pub async fn get_email_by_id(&self, address: &str, id: &str) -> Result<Email> {
        let _guard = self.locks.lock(address).await?;
        self.live_mailbox(address).await?;

        let document = self
            .kv
            .get(&email_key(address, id))
            .await?
            .ok_or_else(|| TempMailError::NotFound("email".to_string()))?;
        Ok(serde_json::from_str(&document)?)
    }

    /// Delete one email. Returns true if it existed.
    pub async fn delete_email(&self, address: &str, id: &str) -> Result<bool> {
        let _guard = self.locks.lock(address).await?;
        self.live_mailbox(address).await?;

        let unlisted = self.kv.lrem(&emails_key(address), id).await?;
        let removed = self.kv.del(&[&email_key(address, id)]).await?;
        Ok(unlisted > 0 || removed > 0)
    }

    /// Delete every email of a live mailbox. Returns true if any existed.
    pub async fn delete_all_emails(&self, address: &str) -> Result<bool> {
        let _guard = self.locks.lock(address).await?;
        self.live_mailbox(address).await?;
        self.clear_emails(address).await
    }

    // ------------------------------------------------------------------
    // Internals (callers hold the mailbox lock)
    // ------------------------------------------------------------------

    /// Load a mailbox that must be live, retiring it if it has lapsed.
    async fn live_mailbox(&self, address: &str) -> Result<Mailbox> {
        let mailbox = self
            .get_mailbox(address)
            .await?
            .ok_or_else(|| TempMailError::UnknownMailbox(address.to_string()))?;

        let now = self.now();
        if mailbox.is_due(now) {
            self.retire(address).await?;
        }
        if !mailbox.is_live(now) {
            return Err(TempMailError::UnknownMailbox(address.to_string()));
        }
        Ok(mailbox)
    }

    async fn write_expiry(&self, mailbox: &Mailbox) -> Result<()> {
        let expires_at = mailbox.expires_at.to_rfc3339();
        self.kv
            .hset(
                &mailbox_key(&mailbox.address),
                &[("expires_at", &expires_at)],
            )
            .await?;
        Ok(())
    }

    /// Flag inactive, cascade-delete emails and schedule the record for reclamation.
    async fn retire(&self, address: &str) -> Result<()> {
        let key = mailbox_key(address);
        self.kv.hset(&key, &[("active", "false")]).await?;
        let had_emails = self.clear_emails(address).await?;
        self.kv.expire(&key, INACTIVE_RETENTION).await?;
        debug!(address, had_emails, "mailbox retired");
        Ok(())
    }

    /// Remove every listed email document and the id list. Returns true if anything existed.
    async fn clear_emails(&self, address: &str) -> Result<bool> {
        let list = emails_key(address);
        let mut keys: Vec<String> = self
            .kv
            .lrange(&list, 0, -1)
            .await?
            .iter()
            .map(|id| email_key(address, id))
            .collect();
        keys.push(list);

        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        Ok(self.kv.del(&refs).await? > 0)
    }
}

fn decode_mailbox(address: &str, fields: &HashMap<String, String>) -> Result<Mailbox> {
    let timestamp = |name: &str| -> Result<DateTime<Utc>> {
        let raw = fields.get(name).ok_or_else(|| {
            TempMailError::Serialization(format!("mailbox {address} is missing {name}"))
        })?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                TempMailError::Serialization(format!("mailbox {address} has bad {name}: {e}"))
            })
    };

    Ok(Mailbox {
        address: fields
            .get("address")
            .cloned()
            .unwrap_or_else(|| address.to_string()),
        created_at: timestamp("created_at")?,
        expires_at: timestamp("expires_at")?,
        active: fields.get("active").map(String::as_str) == Some("true"),
    })
}
