//! Consultation invitation coordinator.
//!
//! Persists the invitation lifecycle and maintains the
//! participant-to-invitations reverse index. The store only guarantees
//! per-key atomicity, so every read-modify-write cycle here (answer
//! updates, index maintenance) is serialized through the entity-keyed
//! distributed lock with a bounded retry budget. The lock is still
//! best-effort - its TTL expiring mid-cycle re-opens the race and the
//! later write wins - which is why the lock TTL is far above any
//! realistic cycle duration.

use crate::cache::DistributedCache;
use crate::config::Config;
use crate::consultation::model::{ConsultationAnswer, ConsultationInvitation};
use crate::errors::StateError;
use crate::lock::{DistributedLock, LockAcquisition};
use crate::notify::ConsultationNotifier;
use crate::store::KeyValueStore;
use common::types::{InvitationId, ParticipantId};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const INVITATION_ENTITY: &str = "invitation";
const INDEX_ENTITY: &str = "index";

fn invitation_key(id: InvitationId) -> String {
    format!("consultation:invitation:{id}")
}

fn index_key(id: ParticipantId) -> String {
    format!("consultation:participant:{id}")
}

/// Coordinates consultation invitations across instances.
pub struct ConsultationCoordinator<S, N> {
    cache: DistributedCache<S>,
    lock: DistributedLock<S>,
    notifier: Arc<N>,
    lock_ttl: Duration,
    lock_retry_attempts: u32,
    lock_retry_delay: Duration,
}

impl<S: KeyValueStore, N: ConsultationNotifier> ConsultationCoordinator<S, N> {
    /// Create the coordinator over `store` using the layer configuration.
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &Config) -> Self {
        Self {
            cache: DistributedCache::new(Arc::clone(&store), config.cache_ttl),
            lock: DistributedLock::new(store),
            notifier,
            lock_ttl: config.lock_ttl,
            lock_retry_attempts: config.lock_retry_attempts,
            lock_retry_delay: config.lock_retry_delay,
        }
    }

    /// Create and persist a new invitation.
    ///
    /// Every response (requester + linked participants) starts as
    /// [`ConsultationAnswer::None`], and the invitation id is appended to
    /// each involved participant's index entry.
    #[instrument(skip_all, fields(requested_for = %requested_for, room = %room_label))]
    pub async fn create_invitation(
        &self,
        requested_for: ParticipantId,
        room_label: &str,
        linked_participants: &[ParticipantId],
        cancel: &CancellationToken,
    ) -> Result<ConsultationInvitation, StateError> {
        let invitation = ConsultationInvitation::new(requested_for, room_label, linked_participants);

        self.write_invitation(&invitation, cancel).await?;

        for participant in invitation.invited_participants() {
            self.index_add(participant, invitation.invitation_id, cancel)
                .await?;
        }

        info!(
            target: "hearing.consultation",
            invitation_id = %invitation.invitation_id,
            requested_for = %requested_for,
            invited_count = invitation.responses.len(),
            "Created consultation invitation"
        );

        Ok(invitation)
    }

    /// Read an invitation from the cache.
    pub async fn invitation(
        &self,
        id: InvitationId,
        cancel: &CancellationToken,
    ) -> Result<Option<ConsultationInvitation>, StateError> {
        self.cache
            .read(INVITATION_ENTITY, &invitation_key(id), cancel)
            .await
    }

    /// Persist an invitation, overwriting any existing record.
    pub async fn write_invitation(
        &self,
        invitation: &ConsultationInvitation,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.cache
            .write(
                INVITATION_ENTITY,
                &invitation_key(invitation.invitation_id),
                invitation,
                cancel,
            )
            .await
    }

    /// Record a participant's answer and notify.
    ///
    /// The read-modify-write is guarded by the invitation-keyed lock.
    /// If the stored answer concludes the invitation (all invited
    /// participants answered positively, or anyone answered negatively),
    /// the record and its index references are retired.
    ///
    /// # Errors
    ///
    /// - `StateError::InvitationNotFound` if the record is absent.
    /// - `StateError::Validation` if `participant_id` is not in the
    ///   invitation's fixed key set.
    /// - `StateError::LockContended` if the entity lock stayed held for
    ///   the whole retry budget.
    #[instrument(skip_all, fields(invitation_id = %id, participant_id = %participant_id))]
    pub async fn update_response(
        &self,
        id: InvitationId,
        participant_id: ParticipantId,
        answer: ConsultationAnswer,
        cancel: &CancellationToken,
    ) -> Result<ConsultationInvitation, StateError> {
        let lock_name = invitation_key(id);
        self.acquire_with_retry(&lock_name, cancel).await?;

        let applied = self.apply_response(id, participant_id, answer, cancel).await;
        let released = self.lock.release(&lock_name, cancel).await;

        let invitation = applied?;
        released?;

        self.notifier
            .consultation_answered(id, participant_id, answer)
            .await;

        if invitation.is_concluded() {
            debug!(
                target: "hearing.consultation",
                invitation_id = %id,
                outcome = ?invitation.outcome(),
                "Invitation concluded; retiring"
            );
            self.retire(&invitation, cancel).await?;
        }

        Ok(invitation)
    }

    /// Delete an invitation and every index reference to it. Deleting an
    /// absent invitation is a no-op success.
    #[instrument(skip_all, fields(invitation_id = %id))]
    pub async fn delete_invitation(
        &self,
        id: InvitationId,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        match self.invitation(id, cancel).await? {
            Some(invitation) => self.retire(&invitation, cancel).await,
            None => Ok(()),
        }
    }

    /// Live invitations referencing the participant, via the reverse
    /// index. Index entries whose invitation record has expired are
    /// pruned as part of the read.
    pub async fn invitations_for_participant(
        &self,
        participant: ParticipantId,
        cancel: &CancellationToken,
    ) -> Result<Vec<ConsultationInvitation>, StateError> {
        let ids = self.read_index(participant, cancel).await?;

        let mut live = Vec::new();
        let mut dead = Vec::new();
        for id in ids {
            match self.invitation(id, cancel).await? {
                Some(invitation) => live.push(invitation),
                None => dead.push(id),
            }
        }

        for id in dead {
            self.index_remove(participant, id, cancel).await?;
        }

        Ok(live)
    }

    /// Retire every invitation referencing the participant (used when a
    /// participant leaves the conference). Returns how many were retired.
    #[instrument(skip_all, fields(participant_id = %participant))]
    pub async fn retire_for_participant(
        &self,
        participant: ParticipantId,
        cancel: &CancellationToken,
    ) -> Result<usize, StateError> {
        let invitations = self.invitations_for_participant(participant, cancel).await?;
        let count = invitations.len();

        for invitation in &invitations {
            self.retire(invitation, cancel).await?;
        }

        if count > 0 {
            info!(
                target: "hearing.consultation",
                participant_id = %participant,
                retired = count,
                "Retired invitations for departing participant"
            );
        }

        Ok(count)
    }

    async fn apply_response(
        &self,
        id: InvitationId,
        participant_id: ParticipantId,
        answer: ConsultationAnswer,
        cancel: &CancellationToken,
    ) -> Result<ConsultationInvitation, StateError> {
        let mut invitation = self
            .invitation(id, cancel)
            .await?
            .ok_or(StateError::InvitationNotFound(id))?;

        invitation.set_answer(participant_id, answer)?;
        self.write_invitation(&invitation, cancel).await?;

        Ok(invitation)
    }

    /// Remove the record, then the id from every involved participant's
    /// index entry. Entries that become empty are deleted outright - an
    /// empty list must never be left behind.
    async fn retire(
        &self,
        invitation: &ConsultationInvitation,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        self.cache
            .remove(&invitation_key(invitation.invitation_id), cancel)
            .await?;

        for participant in invitation.invited_participants() {
            self.index_remove(participant, invitation.invitation_id, cancel)
                .await?;
        }

        debug!(
            target: "hearing.consultation",
            invitation_id = %invitation.invitation_id,
            "Retired invitation"
        );

        Ok(())
    }

    async fn read_index(
        &self,
        participant: ParticipantId,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<InvitationId>, StateError> {
        Ok(self
            .cache
            .read::<BTreeSet<InvitationId>>(INDEX_ENTITY, &index_key(participant), cancel)
            .await?
            .unwrap_or_default())
    }

    async fn index_add(
        &self,
        participant: ParticipantId,
        invitation_id: InvitationId,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        let lock_name = index_key(participant);
        self.acquire_with_retry(&lock_name, cancel).await?;

        let applied = async {
            let mut ids = self.read_index(participant, cancel).await?;
            ids.insert(invitation_id);
            self.cache
                .write(INDEX_ENTITY, &index_key(participant), &ids, cancel)
                .await
        }
        .await;

        let released = self.lock.release(&lock_name, cancel).await;
        applied?;
        released?;
        Ok(())
    }

    async fn index_remove(
        &self,
        participant: ParticipantId,
        invitation_id: InvitationId,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        let lock_name = index_key(participant);
        self.acquire_with_retry(&lock_name, cancel).await?;

        let applied = async {
            let mut ids = self.read_index(participant, cancel).await?;
            if !ids.remove(&invitation_id) {
                return Ok(());
            }

            if ids.is_empty() {
                self.cache.remove(&index_key(participant), cancel).await
            } else {
                self.cache
                    .write(INDEX_ENTITY, &index_key(participant), &ids, cancel)
                    .await
            }
        }
        .await;

        let released = self.lock.release(&lock_name, cancel).await;
        applied?;
        released?;
        Ok(())
    }

    async fn acquire_with_retry(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StateError> {
        let mut attempt = 0;
        loop {
            match self.lock.acquire(name, self.lock_ttl, cancel).await? {
                LockAcquisition::Acquired => return Ok(()),
                LockAcquisition::AlreadyHeld => {
                    attempt += 1;
                    if attempt >= self.lock_retry_attempts {
                        warn!(
                            target: "hearing.consultation",
                            lock = %name,
                            attempts = attempt,
                            "Entity lock contended past retry budget"
                        );
                        return Err(StateError::LockContended(name.to_string()));
                    }
                    tokio::time::sleep(self.lock_retry_delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespaces_are_disjoint() {
        let invitation = InvitationId::new();
        let participant = ParticipantId::new();

        assert_eq!(
            invitation_key(invitation),
            format!("consultation:invitation:{invitation}")
        );
        assert_eq!(
            index_key(participant),
            format!("consultation:participant:{participant}")
        );
    }
}
