//! Hearing layout state: small per-conference cache plus the service
//! that applies a change and broadcasts it to the hearing's hosts.
//!
//! Layout entries keep no history; the last write wins. Two concurrent
//! layout changes for the same conference can race, and the later write
//! silently replaces the earlier one - an accepted limitation of the
//! per-key store semantics.

use crate::cache::DistributedCache;
use crate::conference::{ConferenceCache, ConferenceDetails, HearingDetails};
use crate::config::Config;
use crate::errors::StateError;
use crate::notify::LayoutNotifier;
use crate::store::KeyValueStore;
use common::types::{ConferenceId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

const LAYOUT_ENTITY: &str = "layout";

fn layout_key(id: ConferenceId) -> String {
    format!("layout:{id}")
}

/// On-screen layout selection for a hearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HearingLayout {
    /// Adaptive grid chosen by the video platform.
    #[default]
    Dynamic,
    /// One large tile plus up to seven small ones.
    OnePlus7,
    /// Two large tiles plus up to twenty-one small ones.
    TwoPlus21,
}

/// Read/write access to the per-conference layout entry.
#[derive(Clone)]
pub struct LayoutCache<S> {
    cache: DistributedCache<S>,
}

impl<S: KeyValueStore> LayoutCache<S> {
    /// Create the layout cache over `store`.
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            cache: DistributedCache::new(store, config.cache_ttl),
        }
    }

    /// Current layout for the conference, if one has been written.
    pub async fn read(
        &self,
        id: ConferenceId,
        cancel: &CancellationToken,
    ) -> Result<Option<HearingLayout>, StateError> {
        self.cache
            .read::<HearingLayout>(LAYOUT_ENTITY, &layout_key(id), cancel)
            .await
    }

    /// Store the layout for the conference. Last write wins.
    pub async fn write(
        &self,
        id: ConferenceId,
        layout: HearingLayout,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.cache
            .write(LAYOUT_ENTITY, &layout_key(id), &layout, cancel)
            .await
    }

    /// Drop the layout entry for the conference.
    pub async fn remove(
        &self,
        id: ConferenceId,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.cache.remove(&layout_key(id), cancel).await
    }
}

/// A layout change that was applied and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutChange {
    pub conference_id: ConferenceId,
    pub changed_by: ParticipantId,
    pub new_layout: HearingLayout,
    pub old_layout: HearingLayout,
}

/// Applies layout changes and notifies the hearing's hosts.
pub struct LayoutService<S, N> {
    conferences: Arc<ConferenceCache<S>>,
    layouts: LayoutCache<S>,
    notifier: Arc<N>,
}

impl<S: KeyValueStore, N: LayoutNotifier> LayoutService<S, N> {
    /// Create the service sharing the given conference cache and store.
    pub fn new(conferences: Arc<ConferenceCache<S>>, store: Arc<S>, notifier: Arc<N>, config: &Config) -> Self {
        Self {
            conferences,
            layouts: LayoutCache::new(store, config),
            notifier,
        }
    }

    /// The layout a client should currently render for the conference:
    /// the cached selection, else the conference's mapped layout, else
    /// [`HearingLayout::Dynamic`].
    ///
    /// Returns `Ok(None)` when the conference no longer exists upstream.
    pub async fn current_layout<F, Fut>(
        &self,
        conference_id: ConferenceId,
        fetch: F,
        cancel: &CancellationToken,
    ) -> Result<Option<HearingLayout>, StateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(ConferenceDetails, HearingDetails), StateError>>,
    {
        let conference = match self.conferences.get_or_add(conference_id, fetch, cancel).await {
            Ok(conference) => conference,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        if let Some(layout) = self.layouts.read(conference_id, cancel).await? {
            return Ok(Some(layout));
        }

        Ok(Some(conference.hearing_layout.unwrap_or_default()))
    }

    /// Apply a layout change and broadcast it to the conference's judge
    /// and staff-member participants.
    ///
    /// Fails closed: if the conference cannot be fetched, nothing is
    /// written and nobody is notified. A missing conference yields
    /// `Ok(None)` rather than an error.
    #[instrument(skip_all, fields(conference_id = %conference_id, changed_by = %changed_by))]
    pub async fn update_layout<F, Fut>(
        &self,
        conference_id: ConferenceId,
        changed_by: ParticipantId,
        new_layout: HearingLayout,
        fetch: F,
        cancel: &CancellationToken,
    ) -> Result<Option<LayoutChange>, StateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(ConferenceDetails, HearingDetails), StateError>>,
    {
        let conference = match self.conferences.get_or_add(conference_id, fetch, cancel).await {
            Ok(conference) => conference,
            Err(e) if e.is_not_found() => {
                debug!(
                    target: "hearing.layout",
                    conference_id = %conference_id,
                    "Layout change for unknown conference; nothing written"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let old_layout = match self.layouts.read(conference_id, cancel).await? {
            Some(layout) => layout,
            None => conference.hearing_layout.unwrap_or_default(),
        };

        self.layouts.write(conference_id, new_layout, cancel).await?;

        let recipients: Vec<ParticipantId> =
            conference.host_participants().map(|p| p.id).collect();

        self.notifier
            .layout_changed(conference_id, changed_by, new_layout, old_layout, &recipients)
            .await;

        info!(
            target: "hearing.layout",
            conference_id = %conference_id,
            changed_by = %changed_by,
            old_layout = ?old_layout,
            new_layout = ?new_layout,
            recipient_count = recipients.len(),
            "Hearing layout changed"
        );

        Ok(Some(LayoutChange {
            conference_id,
            changed_by,
            new_layout,
            old_layout,
        }))
    }
}
