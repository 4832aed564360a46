//! Typed distributed cache over the shared store.
//!
//! Every cached entity (conference, invitation, participant index,
//! layout) is read and written through a typed accessor built on this
//! cache - nothing else touches store entries directly. The cache applies
//! one uniform sliding-expiration policy and one canonical encoding.
//!
//! Decoding failures are treated as cache misses, not errors: a payload
//! written under an incompatible schema is logged, counted, and reported
//! absent so the caller repopulates it. Store failures, in contrast,
//! always propagate - a write that cannot reach the store must fail
//! loudly rather than silently succeed on one instance only.

use crate::codec;
use crate::errors::StateError;
use crate::observability::metrics::{record_cache_hit, record_decode_failure, LAYER_DISTRIBUTED};
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Typed key/value cache with sliding expiration.
///
/// Cheaply cloneable; clones share the underlying store handle.
#[derive(Clone)]
pub struct DistributedCache<S> {
    store: Arc<S>,
    ttl: Duration,
}

impl<S: KeyValueStore> DistributedCache<S> {
    /// Create a cache over `store` with the given sliding TTL.
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// The shared store handle (for components that need the raw
    /// primitives, e.g. the distributed lock).
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Sliding TTL applied to entries of this cache.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read and decode the entry under `key`.
    ///
    /// Returns `Ok(None)` for an absent key AND for a present but
    /// undecodable payload; the latter is logged and counted so the
    /// corrupt entry is repopulated by the caller's fallback path.
    /// A successful read refreshes the entry's TTL.
    pub async fn read<T: DeserializeOwned>(
        &self,
        entity: &'static str,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, StateError> {
        let Some(bytes) = self.store.get(key, Some(self.ttl), cancel).await? else {
            return Ok(None);
        };

        match codec::decode::<T>(&bytes) {
            Ok(value) => {
                record_cache_hit(LAYER_DISTRIBUTED, entity);
                Ok(Some(value))
            }
            Err(e) => {
                warn!(
                    target: "hearing.cache",
                    entity = entity,
                    key = %key,
                    error = %e,
                    "Stored payload failed to decode; treating as cache miss"
                );
                record_decode_failure(entity);
                Ok(None)
            }
        }
    }

    /// Encode and store `value` under `key`, overwriting any existing
    /// entry and resetting its TTL.
    pub async fn write<T: Serialize>(
        &self,
        entity: &'static str,
        key: &str,
        value: &T,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        let bytes = codec::encode(value)
            .map_err(|e| StateError::Internal(format!("failed to encode {entity}: {e}")))?;

        self.store.put(key, bytes, self.ttl, cancel).await?;

        debug!(
            target: "hearing.cache",
            entity = entity,
            key = %key,
            "Wrote cache entry"
        );

        Ok(())
    }

    /// Remove the entry under `key`. Removing an absent key is a no-op
    /// success.
    pub async fn remove(&self, key: &str, cancel: &CancellationToken) -> Result<(), StateError> {
        self.store.delete(key, cancel).await?;
        Ok(())
    }
}
