//! Conference aggregate: model, upstream mapping, and the hybrid cache.
//!
//! A conference is the cached snapshot of one scheduled hearing session.
//! It is created by mapping an upstream "conference details + hearing
//! details" response pair, mutated in place as layout/participant state
//! changes, and evicted after an idle period or on hearing cancellation.

mod cache;
mod mapper;
mod model;

pub use cache::ConferenceCache;
pub use mapper::{
    map_conference, ConferenceDetails, EndpointDetails, HearingDetails, ParticipantDetails,
    RoomDetails,
};
pub use model::{
    Conference, ConferenceStatus, ConsultationRoom, Endpoint, EndpointStatus, Participant,
    ParticipantRole, ParticipantStatus,
};
