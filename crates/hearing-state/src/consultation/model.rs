//! Consultation invitation record.

use crate::errors::StateError;
use common::types::{InvitationId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A participant's answer to a consultation invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsultationAnswer {
    /// Not yet answered.
    #[default]
    None,
    Accepted,
    Rejected,
    Cancelled,
    Failed,
    /// The participant accepted and is being moved into the room.
    Transferring,
}

impl ConsultationAnswer {
    /// Whether this answer ends the invitation negatively.
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            ConsultationAnswer::Rejected
                | ConsultationAnswer::Cancelled
                | ConsultationAnswer::Failed
        )
    }
}

/// Aggregate reading of an invitation's responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationOutcome {
    /// At least one invited participant has yet to answer positively.
    Pending,
    /// Every invited participant accepted.
    Accepted,
    /// Somebody rejected, cancelled, or failed to join.
    Declined,
}

/// One private-consultation request and its answers.
///
/// The response key set is exactly the requester plus the linked
/// participants, fixed at creation time; only the values transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationInvitation {
    pub invitation_id: InvitationId,
    /// The participant the consultation was requested for.
    pub requested_for: ParticipantId,
    /// Label of the consultation room the group is invited into.
    pub room_label: String,
    #[serde(default)]
    pub responses: BTreeMap<ParticipantId, ConsultationAnswer>,
}

impl ConsultationInvitation {
    /// Create a new invitation with a fresh id. Every response, the
    /// requester's included, starts as [`ConsultationAnswer::None`].
    #[must_use]
    pub fn new(
        requested_for: ParticipantId,
        room_label: impl Into<String>,
        linked_participants: &[ParticipantId],
    ) -> Self {
        let mut responses = BTreeMap::new();
        responses.insert(requested_for, ConsultationAnswer::None);
        for linked in linked_participants {
            responses.insert(*linked, ConsultationAnswer::None);
        }

        Self {
            invitation_id: InvitationId::new(),
            requested_for,
            room_label: room_label.into(),
            responses,
        }
    }

    /// Every participant named in the invitation (requester included).
    pub fn invited_participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.responses.keys().copied()
    }

    /// Record `participant`'s answer.
    ///
    /// # Errors
    ///
    /// `StateError::Validation` if the participant is not in the fixed
    /// key set - new keys are never added after creation.
    pub fn set_answer(
        &mut self,
        participant: ParticipantId,
        answer: ConsultationAnswer,
    ) -> Result<(), StateError> {
        match self.responses.get_mut(&participant) {
            Some(slot) => {
                *slot = answer;
                Ok(())
            }
            None => Err(StateError::Validation(format!(
                "participant {participant} is not invited to consultation {}",
                self.invitation_id
            ))),
        }
    }

    /// Whether every non-requester participant has answered (their value
    /// is no longer [`ConsultationAnswer::None`]).
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.responses
            .iter()
            .filter(|(id, _)| **id != self.requested_for)
            .all(|(_, answer)| *answer != ConsultationAnswer::None)
    }

    /// Aggregate outcome: accepted only when *all* non-requester answers
    /// are `Accepted`; any negative answer (from anyone, requester
    /// included) declines the whole invitation.
    #[must_use]
    pub fn outcome(&self) -> ConsultationOutcome {
        if self.responses.values().any(|a| a.is_negative()) {
            return ConsultationOutcome::Declined;
        }

        let all_accepted = self
            .responses
            .iter()
            .filter(|(id, _)| **id != self.requested_for)
            .all(|(_, answer)| *answer == ConsultationAnswer::Accepted);

        if all_accepted {
            ConsultationOutcome::Accepted
        } else {
            ConsultationOutcome::Pending
        }
    }

    /// Whether the invitation has reached a final outcome and should be
    /// retired from the cache.
    #[must_use]
    pub fn is_concluded(&self) -> bool {
        self.outcome() != ConsultationOutcome::Pending
    }
}
