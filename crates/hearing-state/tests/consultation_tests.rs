//! Integration tests for the consultation invitation coordinator.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::types::{InvitationId, ParticipantId};
use hearing_state::consultation::{
    ConsultationAnswer, ConsultationCoordinator, ConsultationOutcome,
};
use hearing_state::errors::StateError;
use hearing_state::lock::DistributedLock;
use hearing_state::notify::mock::MockConsultationNotifier;
use hearing_test_utils::fixtures::{test_config, test_config_with};
use hearing_test_utils::MockStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct Rig {
    store: Arc<MockStore>,
    coordinator: ConsultationCoordinator<MockStore, MockConsultationNotifier>,
    notifier: Arc<MockConsultationNotifier>,
}

fn rig() -> Rig {
    let config = test_config();
    let store = Arc::new(MockStore::new());
    let notifier = Arc::new(MockConsultationNotifier::new());
    let coordinator =
        ConsultationCoordinator::new(Arc::clone(&store), Arc::clone(&notifier), &config);
    Rig {
        store,
        coordinator,
        notifier,
    }
}

fn index_key(participant: ParticipantId) -> String {
    format!("consultation:participant:{participant}")
}

fn index_ids(store: &MockStore, participant: ParticipantId) -> BTreeSet<InvitationId> {
    store
        .raw(&index_key(participant))
        .map(|bytes| serde_json::from_slice(&bytes).unwrap())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_create_initializes_every_response_to_none() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let l1 = ParticipantId::new();
    let l2 = ParticipantId::new();

    let invitation = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[l1, l2], &cancel)
        .await
        .unwrap();

    assert_eq!(invitation.responses.len(), 3);
    for id in [requester, l1, l2] {
        assert_eq!(
            invitation.responses.get(&id),
            Some(&ConsultationAnswer::None)
        );
    }
}

#[tokio::test]
async fn test_create_indexes_every_involved_participant() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let linked = ParticipantId::new();

    let invitation = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[linked], &cancel)
        .await
        .unwrap();

    for participant in [requester, linked] {
        let ids = index_ids(&rig.store, participant);
        assert!(
            ids.contains(&invitation.invitation_id),
            "index entry missing for {participant}"
        );
    }
}

#[tokio::test]
async fn test_update_response_changes_only_the_addressed_slot() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let l1 = ParticipantId::new();
    let l2 = ParticipantId::new();

    let invitation = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[l1, l2], &cancel)
        .await
        .unwrap();
    let id = invitation.invitation_id;

    rig.coordinator
        .update_response(id, l1, ConsultationAnswer::Accepted, &cancel)
        .await
        .unwrap();

    let stored = rig.coordinator.invitation(id, &cancel).await.unwrap().unwrap();
    assert_eq!(
        stored.responses.get(&l1),
        Some(&ConsultationAnswer::Accepted)
    );
    assert_eq!(stored.responses.get(&l2), Some(&ConsultationAnswer::None));
    assert_eq!(
        stored.responses.get(&requester),
        Some(&ConsultationAnswer::None)
    );

    let calls = rig.notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls.first().unwrap().participant_id, l1);
    assert_eq!(calls.first().unwrap().answer, ConsultationAnswer::Accepted);
}

#[tokio::test]
async fn test_update_response_never_adds_keys() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let invitation = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[], &cancel)
        .await
        .unwrap();

    let stranger = ParticipantId::new();
    let result = rig
        .coordinator
        .update_response(
            invitation.invitation_id,
            stranger,
            ConsultationAnswer::Accepted,
            &cancel,
        )
        .await;

    assert!(matches!(result, Err(StateError::Validation(_))));

    let stored = rig
        .coordinator
        .invitation(invitation.invitation_id, &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.responses.len(), 1);
    assert_eq!(rig.notifier.call_count(), 0);
}

#[tokio::test]
async fn test_update_response_for_missing_invitation() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let result = rig
        .coordinator
        .update_response(
            InvitationId::new(),
            ParticipantId::new(),
            ConsultationAnswer::Accepted,
            &cancel,
        )
        .await;

    assert!(matches!(result, Err(StateError::InvitationNotFound(_))));
}

#[tokio::test]
async fn test_full_acceptance_retires_invitation_and_indexes() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let l1 = ParticipantId::new();
    let l2 = ParticipantId::new();

    let invitation = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[l1, l2], &cancel)
        .await
        .unwrap();
    let id = invitation.invitation_id;

    let after_first = rig
        .coordinator
        .update_response(id, l1, ConsultationAnswer::Accepted, &cancel)
        .await
        .unwrap();
    assert_eq!(after_first.outcome(), ConsultationOutcome::Pending);
    assert!(rig.coordinator.invitation(id, &cancel).await.unwrap().is_some());

    let after_second = rig
        .coordinator
        .update_response(id, l2, ConsultationAnswer::Accepted, &cancel)
        .await
        .unwrap();
    assert_eq!(after_second.outcome(), ConsultationOutcome::Accepted);

    // Concluded: record gone, no index entry left for anyone.
    assert!(rig.coordinator.invitation(id, &cancel).await.unwrap().is_none());
    for participant in [requester, l1, l2] {
        assert!(
            !rig.store.contains(&index_key(participant)),
            "index entry left behind for {participant}"
        );
    }
}

#[tokio::test]
async fn test_rejection_concludes_immediately() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let l1 = ParticipantId::new();
    let l2 = ParticipantId::new();

    let invitation = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[l1, l2], &cancel)
        .await
        .unwrap();
    let id = invitation.invitation_id;

    let updated = rig
        .coordinator
        .update_response(id, l1, ConsultationAnswer::Rejected, &cancel)
        .await
        .unwrap();

    assert_eq!(updated.outcome(), ConsultationOutcome::Declined);
    assert!(rig.coordinator.invitation(id, &cancel).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_id_from_every_index_entry() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let linked = ParticipantId::new();

    // Two invitations touching the same requester.
    let first = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[linked], &cancel)
        .await
        .unwrap();
    let second = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom2", &[], &cancel)
        .await
        .unwrap();

    rig.coordinator
        .delete_invitation(first.invitation_id, &cancel)
        .await
        .unwrap();

    // The requester still has an entry for the surviving invitation...
    let ids = index_ids(&rig.store, requester);
    assert_eq!(ids, BTreeSet::from([second.invitation_id]));

    // ...while the linked participant's entry, now empty, was deleted
    // outright rather than left as an empty list.
    assert!(!rig.store.contains(&index_key(linked)));
}

#[tokio::test]
async fn test_delete_absent_invitation_is_noop() -> anyhow::Result<()> {
    let rig = rig();
    let cancel = CancellationToken::new();

    rig.coordinator
        .delete_invitation(InvitationId::new(), &cancel)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_invitations_for_participant_returns_live_records() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let first = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom1", &[], &cancel)
        .await
        .unwrap();
    let second = rig
        .coordinator
        .create_invitation(requester, "ConsultationRoom2", &[], &cancel)
        .await
        .unwrap();

    let mut found: Vec<InvitationId> = rig
        .coordinator
        .invitations_for_participant(requester, &cancel)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.invitation_id)
        .collect();
    found.sort();

    let mut expected = vec![first.invitation_id, second.invitation_id];
    expected.sort();
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_stale_index_entries_are_pruned_on_read() {
    let config = test_config();

    // An index entry pointing at an invitation whose record expired.
    let participant = ParticipantId::new();
    let ghost = InvitationId::new();
    let payload = serde_json::to_vec(&BTreeSet::from([ghost])).unwrap();
    let store = Arc::new(MockStore::new().with_entry(
        &index_key(participant),
        &payload,
        Duration::from_secs(600),
    ));

    let notifier = Arc::new(MockConsultationNotifier::new());
    let coordinator =
        ConsultationCoordinator::new(Arc::clone(&store), Arc::clone(&notifier), &config);
    let cancel = CancellationToken::new();

    let live = coordinator
        .invitations_for_participant(participant, &cancel)
        .await
        .unwrap();

    assert!(live.is_empty());
    // The dangling id was pruned and the empty entry deleted.
    assert!(!store.contains(&index_key(participant)));
}

#[tokio::test]
async fn test_retire_for_participant_cleans_cross_references() {
    let rig = rig();
    let cancel = CancellationToken::new();

    let leaver = ParticipantId::new();
    let other = ParticipantId::new();

    rig.coordinator
        .create_invitation(leaver, "ConsultationRoom1", &[other], &cancel)
        .await
        .unwrap();
    rig.coordinator
        .create_invitation(other, "ConsultationRoom2", &[leaver], &cancel)
        .await
        .unwrap();
    let unrelated = rig
        .coordinator
        .create_invitation(other, "ConsultationRoom3", &[], &cancel)
        .await
        .unwrap();

    let retired = rig
        .coordinator
        .retire_for_participant(leaver, &cancel)
        .await
        .unwrap();
    assert_eq!(retired, 2);

    // The leaver has no index entry at all.
    assert!(!rig.store.contains(&index_key(leaver)));

    // The other participant keeps only the unrelated invitation.
    let ids = index_ids(&rig.store, other);
    assert_eq!(ids, BTreeSet::from([unrelated.invitation_id]));
}

#[tokio::test]
async fn test_contended_entity_lock_is_a_typed_error() {
    let config = test_config_with(|vars| {
        vars.insert("HEARING_LOCK_RETRY_ATTEMPTS".to_string(), "2".to_string());
        vars.insert("HEARING_LOCK_RETRY_DELAY_MILLIS".to_string(), "1".to_string());
    });
    let store = Arc::new(MockStore::new());
    let notifier = Arc::new(MockConsultationNotifier::new());
    let coordinator =
        ConsultationCoordinator::new(Arc::clone(&store), Arc::clone(&notifier), &config);
    let cancel = CancellationToken::new();

    let requester = ParticipantId::new();
    let invitation = coordinator
        .create_invitation(requester, "ConsultationRoom1", &[], &cancel)
        .await
        .unwrap();

    // Another instance holds the invitation's entity lock.
    let lock = DistributedLock::new(Arc::clone(&store));
    let lock_name = format!("consultation:invitation:{}", invitation.invitation_id);
    assert!(lock
        .acquire(&lock_name, Duration::from_secs(30), &cancel)
        .await
        .unwrap()
        .is_acquired());

    let result = coordinator
        .update_response(
            invitation.invitation_id,
            requester,
            ConsultationAnswer::Accepted,
            &cancel,
        )
        .await;

    assert!(matches!(result, Err(StateError::LockContended(_))));
    assert_eq!(notifier.call_count(), 0);
}
