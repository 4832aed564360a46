//! Notifier boundary.
//!
//! Narrow contracts this core calls outward on state transitions. The
//! real implementations (browser push, event grid, etc.) live in the
//! hosting service; this layer's only obligation is to call them with
//! correct, complete arguments at the correct transition points.
//! Implementations handle their own delivery failures - a failed
//! notification never rolls back persisted state.

use crate::consultation::ConsultationAnswer;
use crate::layout::HearingLayout;
use async_trait::async_trait;
use common::types::{ConferenceId, InvitationId, ParticipantId};

/// Receives hearing-layout changes, scoped to the given recipients
/// (judge and staff-member participants).
#[async_trait]
pub trait LayoutNotifier: Send + Sync {
    async fn layout_changed(
        &self,
        conference_id: ConferenceId,
        changed_by: ParticipantId,
        new_layout: HearingLayout,
        old_layout: HearingLayout,
        recipients: &[ParticipantId],
    );
}

/// Receives consultation invitation answers.
#[async_trait]
pub trait ConsultationNotifier: Send + Sync {
    async fn consultation_answered(
        &self,
        invitation_id: InvitationId,
        participant_id: ParticipantId,
        answer: ConsultationAnswer,
    );
}

/// Recording notifier fakes for tests.
pub mod mock {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One recorded `layout_changed` call.
    #[derive(Debug, Clone, PartialEq)]
    pub struct LayoutChangedCall {
        pub conference_id: ConferenceId,
        pub changed_by: ParticipantId,
        pub new_layout: HearingLayout,
        pub old_layout: HearingLayout,
        pub recipients: Vec<ParticipantId>,
    }

    /// Layout notifier that records every call.
    #[derive(Debug, Default)]
    pub struct MockLayoutNotifier {
        calls: Mutex<Vec<LayoutChangedCall>>,
    }

    impl MockLayoutNotifier {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// All calls recorded so far.
        #[must_use]
        pub fn calls(&self) -> Vec<LayoutChangedCall> {
            lock(&self.calls).clone()
        }

        #[must_use]
        pub fn call_count(&self) -> usize {
            lock(&self.calls).len()
        }
    }

    #[async_trait]
    impl LayoutNotifier for MockLayoutNotifier {
        async fn layout_changed(
            &self,
            conference_id: ConferenceId,
            changed_by: ParticipantId,
            new_layout: HearingLayout,
            old_layout: HearingLayout,
            recipients: &[ParticipantId],
        ) {
            lock(&self.calls).push(LayoutChangedCall {
                conference_id,
                changed_by,
                new_layout,
                old_layout,
                recipients: recipients.to_vec(),
            });
        }
    }

    /// One recorded `consultation_answered` call.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ConsultationAnsweredCall {
        pub invitation_id: InvitationId,
        pub participant_id: ParticipantId,
        pub answer: ConsultationAnswer,
    }

    /// Consultation notifier that records every call.
    #[derive(Debug, Default)]
    pub struct MockConsultationNotifier {
        calls: Mutex<Vec<ConsultationAnsweredCall>>,
    }

    impl MockConsultationNotifier {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// All calls recorded so far.
        #[must_use]
        pub fn calls(&self) -> Vec<ConsultationAnsweredCall> {
            lock(&self.calls).clone()
        }

        #[must_use]
        pub fn call_count(&self) -> usize {
            lock(&self.calls).len()
        }
    }

    #[async_trait]
    impl ConsultationNotifier for MockConsultationNotifier {
        async fn consultation_answered(
            &self,
            invitation_id: InvitationId,
            participant_id: ParticipantId,
            answer: ConsultationAnswer,
        ) {
            lock(&self.calls).push(ConsultationAnsweredCall {
                invitation_id,
                participant_id,
                answer,
            });
        }
    }
}
