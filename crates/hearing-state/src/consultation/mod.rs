//! Private-consultation invitations: model and coordinator.
//!
//! An invitation coordinates one breakout-room request among a requester
//! and their linked participants. The coordinator persists the
//! invitation lifecycle in the distributed cache and maintains a
//! participant-to-invitations reverse index for lookup and cleanup.

mod coordinator;
mod model;

pub use coordinator::ConsultationCoordinator;
pub use model::{ConsultationAnswer, ConsultationInvitation, ConsultationOutcome};
