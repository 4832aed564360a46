//! Error types for the hearing state layer.
//!
//! Two layers of errors:
//!
//! - [`StoreError`] - failures talking to the shared key/value store
//!   (unavailable, timed out, cancelled). Always transient from the
//!   caller's point of view.
//! - [`StateError`] - everything the typed accessors can surface:
//!   not-found outcomes, mapping/validation failures, lock contention,
//!   and wrapped store failures.
//!
//! Decode failures never appear here: the cache layer treats undecodable
//! payloads as misses (logged and counted), so the system self-heals by
//! refetching instead of failing requests over stale persisted state.

use common::types::{ConferenceId, InvitationId, ParticipantId};
use thiserror::Error;

/// Failure reaching or using the shared key/value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The operation exceeded the configured time bound.
    #[error("store operation timed out: {operation}")]
    Timeout {
        /// Which operation timed out (bounded set: get/put/put_if_absent/delete).
        operation: &'static str,
    },

    /// The caller cancelled the operation while it was in flight.
    #[error("store operation cancelled")]
    Cancelled,
}

/// Error type for the conference-state and consultation layer.
#[derive(Debug, Error)]
pub enum StateError {
    /// Upstream reports the conference no longer exists. Callers commonly
    /// translate this into an empty/null result rather than a hard failure.
    #[error("conference not found: {0}")]
    ConferenceNotFound(ConferenceId),

    /// The consultation invitation is not (or no longer) in the cache.
    #[error("consultation invitation not found: {0}")]
    InvitationNotFound(InvitationId),

    /// The participant is not part of the conference or invitation.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// An upstream value could not be translated into the internal
    /// vocabulary. Unknown roles/statuses must surface here, never
    /// silently become a default active state.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// The request violates an invariant (e.g. answering an invitation
    /// for a participant outside its fixed key set).
    #[error("validation error: {0}")]
    Validation(String),

    /// The entity lock stayed held for the whole retry budget.
    #[error("lock contended: {0}")]
    LockContended(String),

    /// Upstream fetch failed for a reason other than not-found.
    /// Propagated unchanged to the caller.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Shared store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal error (e.g. a value of our own failed to encode).
    #[error("internal error: {0}")]
    Internal(String),
}

impl StateError {
    /// Whether this error is a not-found outcome the immediate caller
    /// usually translates into a null/empty result.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StateError::ConferenceNotFound(_)
                | StateError::InvitationNotFound(_)
                | StateError::ParticipantNotFound(_)
        )
    }

    /// Whether retrying the same operation may succeed without any
    /// intervening change (store hiccups and lock contention).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            StateError::Store(StoreError::Unavailable(_) | StoreError::Timeout { .. }) => true,
            StateError::LockContended(_) => true,
            _ => false,
        }
    }
}
