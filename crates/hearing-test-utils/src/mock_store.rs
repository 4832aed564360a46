//! In-memory key/value store mock for state testing.
//!
//! Implements the same `KeyValueStore` contract as the Redis store:
//! per-key atomicity, TTL expiry (against the tokio clock, so tests can
//! `pause`/`advance` time), sliding refresh on read, and atomic
//! `put_if_absent`. Fault injection lets tests exercise the
//! store-unavailable paths.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = MockStore::new().with_entry("conference:123", b"{}", Duration::from_secs(60));
//!
//! // Make the next operation fail
//! store.fail_next(1);
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use hearing_state::errors::StoreError;
use hearing_state::store::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct MockEntry {
    value: Bytes,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    entries: HashMap<String, MockEntry>,
    /// Operations left to fail before behaving normally again.
    failures_remaining: u32,
    /// When set, every operation fails.
    unavailable: bool,
}

/// Mock store for testing the cache/lock/coordinator layers.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

impl MockStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry (builder style).
    #[must_use]
    pub fn with_entry(self, key: &str, value: &[u8], ttl: Duration) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.entries.insert(
                key.to_string(),
                MockEntry {
                    value: Bytes::copy_from_slice(value),
                    expires_at: Instant::now() + ttl,
                },
            );
        }
        self
    }

    /// Fail the next `count` operations with `StoreError::Unavailable`.
    pub fn fail_next(&self, count: u32) {
        self.inner.lock().unwrap().failures_remaining = count;
    }

    /// Toggle permanent unavailability.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    /// Raw bytes currently stored under `key` (ignoring expiry).
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Bytes> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .get(key)
            .map(|e| e.value.clone())
    }

    /// Whether a live (non-expired) entry exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at > Instant::now())
    }

    /// Remaining TTL of the entry under `key`, if it is live.
    #[must_use]
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.lock().unwrap();
        inner.entries.get(key).and_then(|e| {
            let now = Instant::now();
            (e.expires_at > now).then(|| e.expires_at - now)
        })
    }

    /// All keys with a live entry.
    #[must_use]
    pub fn live_keys(&self) -> Vec<String> {
        let now = Instant::now();
        let inner = self.inner.lock().unwrap();
        let mut keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.expires_at > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Clear all state.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.failures_remaining = 0;
        inner.unavailable = false;
    }

    fn check_faults(inner: &mut MockStoreInner, operation: &'static str) -> Result<(), StoreError> {
        if inner.unavailable {
            return Err(StoreError::Unavailable(format!(
                "{operation} failed: mock store unavailable"
            )));
        }
        if inner.failures_remaining > 0 {
            inner.failures_remaining -= 1;
            return Err(StoreError::Unavailable(format!(
                "{operation} failed: injected fault"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    async fn get(
        &self,
        key: &str,
        refresh: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Option<Bytes>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut inner = self.inner.lock().unwrap();
        Self::check_faults(&mut inner, "get")?;

        let now = Instant::now();
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => return Ok(None),
        };
        if expired {
            inner.entries.remove(key);
            return Ok(None);
        }

        match inner.entries.get_mut(key) {
            Some(entry) => {
                if let Some(ttl) = refresh {
                    entry.expires_at = now + ttl;
                }
                Ok(Some(entry.value.clone()))
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut inner = self.inner.lock().unwrap();
        Self::check_faults(&mut inner, "put")?;

        inner.entries.insert(
            key.to_string(),
            MockEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut inner = self.inner.lock().unwrap();
        Self::check_faults(&mut inner, "put_if_absent")?;

        let now = Instant::now();
        let live = inner
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at > now);
        if live {
            return Ok(false);
        }

        inner.entries.insert(
            key.to_string(),
            MockEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str, cancel: &CancellationToken) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut inner = self.inner.lock().unwrap();
        Self::check_faults(&mut inner, "delete")?;

        inner.entries.remove(key);
        Ok(())
    }
}
