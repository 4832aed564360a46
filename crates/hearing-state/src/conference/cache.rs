//! Hybrid conference cache: process-local fast path over the shared
//! distributed cache.
//!
//! The distributed store is the source of truth; the local layer is a
//! read-through/write-through accelerator only. It can serve data stale
//! by up to its idle TTL, so any code path that learns of an
//! authoritative state change must call [`ConferenceCache::force_refresh`]
//! (or [`ConferenceCache::update`] with the new snapshot) rather than
//! trusting the local entry.

use crate::cache::DistributedCache;
use crate::conference::mapper::{map_conference, ConferenceDetails, HearingDetails};
use crate::conference::model::Conference;
use crate::config::Config;
use crate::errors::StateError;
use crate::observability::metrics::{record_cache_hit, record_cache_miss, record_upstream_fetch, LAYER_LOCAL};
use crate::store::KeyValueStore;
use common::types::ConferenceId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const CONFERENCE_ENTITY: &str = "conference";

fn conference_key(id: ConferenceId) -> String {
    format!("conference:{id}")
}

struct LocalEntry {
    conference: Conference,
    expires_at: Instant,
}

/// Get-or-populate cache for conference snapshots.
pub struct ConferenceCache<S> {
    distributed: DistributedCache<S>,
    local: RwLock<HashMap<ConferenceId, LocalEntry>>,
    local_ttl: Duration,
    local_enabled: bool,
}

impl<S: KeyValueStore> ConferenceCache<S> {
    /// Create the cache over `store` using the layer configuration.
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            distributed: DistributedCache::new(store, config.cache_ttl),
            local: RwLock::new(HashMap::new()),
            local_ttl: config.local_cache_ttl,
            local_enabled: config.local_cache_enabled,
        }
    }

    /// Fetch the conference snapshot, populating the cache on a miss.
    ///
    /// Resolution order: local entry, distributed entry, then `fetch` -
    /// the injected upstream call returning the conference+hearing detail
    /// pair, which is mapped and written through both layers. Two
    /// back-to-back calls never invoke `fetch` twice.
    ///
    /// # Errors
    ///
    /// `StateError::ConferenceNotFound` when `fetch` reports the
    /// conference gone upstream; mapping and store errors propagate
    /// unchanged.
    #[instrument(skip_all, fields(conference_id = %id))]
    pub async fn get_or_add<F, Fut>(
        &self,
        id: ConferenceId,
        fetch: F,
        cancel: &CancellationToken,
    ) -> Result<Conference, StateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(ConferenceDetails, HearingDetails), StateError>>,
    {
        if let Some(conference) = self.local_get(id).await {
            record_cache_hit(LAYER_LOCAL, CONFERENCE_ENTITY);
            return Ok(conference);
        }

        if let Some(conference) = self
            .distributed
            .read::<Conference>(CONFERENCE_ENTITY, &conference_key(id), cancel)
            .await?
        {
            self.local_put(conference.clone()).await;
            return Ok(conference);
        }

        record_cache_miss(CONFERENCE_ENTITY);
        record_upstream_fetch();
        debug!(
            target: "hearing.conference.cache",
            conference_id = %id,
            "Cache miss; fetching conference from upstream"
        );

        let (details, hearing) = fetch().await?;
        let conference = map_conference(details, hearing)?;
        self.write_through(&conference, cancel).await?;

        Ok(conference)
    }

    /// Overwrite both layers with `conference` so subsequent reads see
    /// fresh data without a full refetch.
    #[instrument(skip_all, fields(conference_id = %conference.id))]
    pub async fn update(
        &self,
        conference: &Conference,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.write_through(conference, cancel).await
    }

    /// Refetch from upstream and overwrite both layers, bypassing any
    /// existing entry. Used when an external event signals the cached
    /// data is known stale.
    #[instrument(skip_all, fields(conference_id = %id))]
    pub async fn force_refresh<F, Fut>(
        &self,
        id: ConferenceId,
        fetch: F,
        cancel: &CancellationToken,
    ) -> Result<Conference, StateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(ConferenceDetails, HearingDetails), StateError>>,
    {
        record_upstream_fetch();

        let (details, hearing) = fetch().await?;
        let conference = map_conference(details, hearing)?;
        self.write_through(&conference, cancel).await?;

        debug!(
            target: "hearing.conference.cache",
            conference_id = %id,
            "Force-refreshed conference"
        );

        Ok(conference)
    }

    /// Evict the conference from both layers (hearing cancelled/closed).
    #[instrument(skip_all, fields(conference_id = %id))]
    pub async fn remove(
        &self,
        id: ConferenceId,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.distributed.remove(&conference_key(id), cancel).await?;
        self.local.write().await.remove(&id);
        Ok(())
    }

    /// Store first (source of truth, fails loudly), then local.
    async fn write_through(
        &self,
        conference: &Conference,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.distributed
            .write(
                CONFERENCE_ENTITY,
                &conference_key(conference.id),
                conference,
                cancel,
            )
            .await?;
        self.local_put(conference.clone()).await;
        Ok(())
    }

    async fn local_get(&self, id: ConferenceId) -> Option<Conference> {
        if !self.local_enabled {
            return None;
        }

        {
            let guard = self.local.read().await;
            match guard.get(&id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.conference.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but expired; drop it so the map does not grow.
        let mut guard = self.local.write().await;
        if let Some(entry) = guard.get(&id) {
            if entry.expires_at <= Instant::now() {
                guard.remove(&id);
            }
        }
        None
    }

    async fn local_put(&self, conference: Conference) {
        if !self.local_enabled {
            return;
        }

        let entry = LocalEntry {
            conference,
            expires_at: Instant::now() + self.local_ttl,
        };
        let mut guard = self.local.write().await;
        guard.insert(entry.conference.id, entry);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_conference_key_format() {
        let id = ConferenceId::new();
        assert_eq!(conference_key(id), format!("conference:{id}"));
    }
}
