//! Striped per-mailbox locks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::{Result, TempMailError};

/// A fixed pool of async mutexes addressed by key hash.
///
/// Two keys may share a stripe, which only costs some extra serialization;
/// the same key always maps to the same stripe.
pub struct MailboxLocks {
    stripes: Box<[Mutex<()>]>,
    mask: u64,
    timeout: Duration,
}

impl MailboxLocks {
    /// Create a pool with at least `size` stripes (rounded up to a power of two).
    pub fn new(size: usize, timeout: Duration) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            stripes: (0..size)
                .map(|_| Mutex::new(()))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            mask: (size - 1) as u64,
            timeout,
        }
    }

    fn stripe(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() & self.mask) as usize
    }

    /// Lock the stripe for `key`, waiting at most the configured timeout.
    pub async fn lock(&self, key: &str) -> Result<MutexGuard<'_, ()>> {
        tokio::time::timeout(self.timeout, self.stripes[self.stripe(key)].lock())
            .await
            .map_err(|_| {
                TempMailError::StoreUnavailable(format!("timed out waiting for lock on {key}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_rounds_up() {
        let locks = MailboxLocks::new(100, Duration::from_secs(1));
        assert_eq!(locks.stripes.len(), 128);

        let locks = MailboxLocks::new(0, Duration::from_secs(1));
        assert_eq!(locks.stripes.len(), 1);
    }

    #[test]
    fn test_same_key_same_stripe() {
        let locks = MailboxLocks::new(64, Duration::from_secs(1));
        assert_eq!(locks.stripe("a@hide-mail.org"), locks.stripe("a@hide-mail.org"));
    }

    #[tokio::test]
    async fn test_lock_times_out_when_held() {
        let locks = MailboxLocks::new(1, Duration::from_millis(20));
        let _held = locks.lock("a@hide-mail.org").await.unwrap();

        let err = locks.lock("b@hide-mail.org").await.unwrap_err();
        assert!(matches!(err, TempMailError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = MailboxLocks::new(1, Duration::from_millis(20));
        drop(locks.lock("a@hide-mail.org").await.unwrap());
        assert!(locks.lock("a@hide-mail.org").await.is_ok());
    }
}
