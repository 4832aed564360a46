//! Distributed mutual-exclusion primitive over the shared store.
//!
//! Used to prevent duplicate side effects when concurrent requests race
//! across instances (e.g. marking a one-time event as done) and to
//! serialize the read-modify-write cycles of the consultation
//! coordinator.
//!
//! # Guarantee
//!
//! Best-effort, at-most-once per TTL window. Acquisition is a single
//! atomic `SET NX EX`, so two racing acquirers cannot both win within a
//! window - but TTL expiry silently frees a held lock, and release by a
//! crashed holder never happens before then. Do not rely on this where
//! strict linearizable exclusion is required.

use crate::errors::StateError;
use crate::observability::metrics::record_lock_outcome;
use crate::store::KeyValueStore;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sentinel value written under a held lock's key.
const LOCK_SENTINEL: &[u8] = b"locked";

/// Outcome of a lock acquisition attempt.
///
/// The legacy store used an inverted boolean here (`true` meaning
/// "already held"); this enum removes that foot-gun while preserving the
/// observable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAcquisition {
    /// The lock was free and is now held by the caller.
    Acquired,
    /// Someone else holds the lock; the caller must not proceed with the
    /// guarded action.
    AlreadyHeld,
}

impl LockAcquisition {
    /// Whether the caller now holds the lock.
    #[must_use]
    pub fn is_acquired(self) -> bool {
        matches!(self, LockAcquisition::Acquired)
    }
}

/// Named best-effort lock over the shared store.
#[derive(Clone)]
pub struct DistributedLock<S> {
    store: Arc<S>,
}

fn lock_key(name: &str) -> String {
    format!("lock:{name}")
}

impl<S: KeyValueStore> DistributedLock<S> {
    /// Create a lock facility over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Try to acquire the named lock for `ttl`.
    ///
    /// A non-expired entry under the lock key means "held"; absence means
    /// "free". The check and the claim are one atomic store operation.
    pub async fn acquire(
        &self,
        name: &str,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<LockAcquisition, StateError> {
        let claimed = self
            .store
            .put_if_absent(
                &lock_key(name),
                Bytes::from_static(LOCK_SENTINEL),
                ttl,
                cancel,
            )
            .await?;

        record_lock_outcome(claimed);
        debug!(
            target: "hearing.lock",
            name = %name,
            acquired = claimed,
            ttl_seconds = ttl.as_secs(),
            "Lock acquisition attempt"
        );

        Ok(if claimed {
            LockAcquisition::Acquired
        } else {
            LockAcquisition::AlreadyHeld
        })
    }

    /// Release the named lock.
    ///
    /// Releasing a lock that is not held (or already expired) is a no-op
    /// success.
    pub async fn release(&self, name: &str, cancel: &CancellationToken) -> Result<(), StateError> {
        self.store.delete(&lock_key(name), cancel).await?;

        debug!(target: "hearing.lock", name = %name, "Lock released");
        Ok(())
    }
}
