//! Shared key/value store abstraction.
//!
//! The distributed store is the single source of truth for conference
//! state across web instances. It is always injected as a trait object or
//! generic parameter - never a singleton - so tests substitute an
//! in-memory fake implementing the same contract.
//!
//! Per-key operations are atomic at the store; composite read-then-write
//! sequences are NOT, and the layers above account for that (see the
//! distributed lock and the consultation coordinator).

mod redis;

pub use self::redis::RedisStore;

use crate::errors::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Contract every shared store implementation satisfies.
///
/// All operations are bounded in time and honor the caller-supplied
/// cancellation token: a cancelled request abandons the in-flight store
/// call with [`StoreError::Cancelled`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw bytes stored under `key`.
    ///
    /// When `refresh` is set and the key is present, the entry's TTL is
    /// reset to that duration as part of the read (sliding expiration).
    async fn get(
        &self,
        key: &str,
        refresh: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Option<Bytes>, StoreError>;

    /// Store `value` under `key` with the given TTL, overwriting any
    /// existing entry.
    async fn put(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>;

    /// Atomically store `value` under `key` only if the key is absent.
    ///
    /// Returns `true` if the write happened, `false` if the key already
    /// existed. This is the atomic primitive beneath the distributed
    /// lock; implementations must not decompose it into a read followed
    /// by a write.
    async fn put_if_absent(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError>;

    /// Remove the entry under `key`. Deleting an absent key is a no-op
    /// success.
    async fn delete(&self, key: &str, cancel: &CancellationToken) -> Result<(), StoreError>;
}
