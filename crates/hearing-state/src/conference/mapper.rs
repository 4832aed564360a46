//! Mapping from the upstream booking/hearing API shapes into the
//! conference aggregate.
//!
//! Upstream enums arrive as strings and translate 1:1 into the internal
//! vocabulary. An unknown value is a typed mapping error - it must never
//! silently become a default active state.

use crate::conference::model::{
    ensure_unique, Conference, ConferenceStatus, ConsultationRoom, Endpoint, EndpointStatus,
    Participant, ParticipantRole, ParticipantStatus,
};
use crate::errors::StateError;
use crate::layout::HearingLayout;
use chrono::{DateTime, Utc};
use common::types::{ConferenceId, EndpointId, HearingId, ParticipantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upstream conference detail response (video API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConferenceDetails {
    pub id: Uuid,
    pub hearing_id: Uuid,
    pub current_status: String,
    pub scheduled_date_time: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<ParticipantDetails>,
    #[serde(default)]
    pub endpoints: Vec<EndpointDetails>,
    #[serde(default)]
    pub hearing_layout: Option<String>,
}

/// Upstream participant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDetails {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub user_role: String,
    pub hearing_role: String,
    pub current_status: String,
    #[serde(default)]
    pub current_room: Option<RoomDetails>,
    #[serde(default)]
    pub linked_participants: Vec<Uuid>,
}

/// Upstream consultation room record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetails {
    pub label: String,
    #[serde(default)]
    pub locked: bool,
}

/// Upstream endpoint record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDetails {
    pub id: Uuid,
    pub display_name: String,
    pub status: String,
    #[serde(default)]
    pub defence_advocate_username: Option<String>,
}

/// Upstream hearing detail response (booking API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HearingDetails {
    pub case_number: String,
    pub case_type: String,
    pub hearing_venue_name: String,
    pub created_date_time: DateTime<Utc>,
    pub scheduled_duration_minutes: u32,
    #[serde(default)]
    pub is_scottish: bool,
}

/// Build the conference aggregate from the upstream detail pair.
///
/// # Errors
///
/// `StateError::Mapping` for unknown role/status/layout vocabulary or
/// duplicate participant/endpoint ids in the upstream payload.
pub fn map_conference(
    details: ConferenceDetails,
    hearing: HearingDetails,
) -> Result<Conference, StateError> {
    let participants = details
        .participants
        .into_iter()
        .map(map_participant)
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(participants.iter().map(|p| p.id), "participant")
        .map_err(|_| StateError::Mapping("duplicate participant id in upstream payload".into()))?;

    let endpoints = details
        .endpoints
        .into_iter()
        .map(map_endpoint)
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(endpoints.iter().map(|e| e.id), "endpoint")
        .map_err(|_| StateError::Mapping("duplicate endpoint id in upstream payload".into()))?;

    let hearing_layout = details
        .hearing_layout
        .as_deref()
        .map(map_layout)
        .transpose()?;

    Ok(Conference {
        id: ConferenceId(details.id),
        hearing_id: HearingId(details.hearing_id),
        case_number: hearing.case_number,
        case_type: hearing.case_type,
        scheduled_datetime: details.scheduled_date_time,
        created_datetime: hearing.created_date_time,
        scheduled_duration_minutes: hearing.scheduled_duration_minutes,
        hearing_venue_name: hearing.hearing_venue_name,
        status: map_conference_status(&details.current_status)?,
        participants,
        endpoints,
        hearing_layout,
        is_scottish: hearing.is_scottish,
    })
}

fn map_participant(details: ParticipantDetails) -> Result<Participant, StateError> {
    Ok(Participant {
        id: ParticipantId(details.id),
        username: details.username,
        display_name: details.display_name,
        role: map_role(&details.user_role)?,
        hearing_role: details.hearing_role,
        status: map_participant_status(&details.current_status)?,
        current_room: details.current_room.map(|room| ConsultationRoom {
            label: room.label,
            locked: room.locked,
        }),
        linked_participants: details
            .linked_participants
            .into_iter()
            .map(ParticipantId)
            .collect(),
    })
}

fn map_endpoint(details: EndpointDetails) -> Result<Endpoint, StateError> {
    Ok(Endpoint {
        id: EndpointId(details.id),
        display_name: details.display_name,
        status: map_endpoint_status(&details.status)?,
        defence_advocate_username: details.defence_advocate_username,
    })
}

fn map_role(raw: &str) -> Result<ParticipantRole, StateError> {
    match raw {
        "Judge" => Ok(ParticipantRole::Judge),
        "StaffMember" => Ok(ParticipantRole::StaffMember),
        "JudicialOfficeHolder" => Ok(ParticipantRole::JudicialOfficeHolder),
        "Individual" => Ok(ParticipantRole::Individual),
        "Representative" => Ok(ParticipantRole::Representative),
        "QuickLinkParticipant" => Ok(ParticipantRole::QuickLinkParticipant),
        "QuickLinkObserver" => Ok(ParticipantRole::QuickLinkObserver),
        other => Err(StateError::Mapping(format!(
            "unknown participant role: {other}"
        ))),
    }
}

fn map_participant_status(raw: &str) -> Result<ParticipantStatus, StateError> {
    match raw {
        "NotSignedIn" => Ok(ParticipantStatus::NotSignedIn),
        "Joining" => Ok(ParticipantStatus::Joining),
        "Available" => Ok(ParticipantStatus::Available),
        "InHearing" => Ok(ParticipantStatus::InHearing),
        "InConsultation" => Ok(ParticipantStatus::InConsultation),
        "Disconnected" => Ok(ParticipantStatus::Disconnected),
        other => Err(StateError::Mapping(format!(
            "unknown participant status: {other}"
        ))),
    }
}

fn map_conference_status(raw: &str) -> Result<ConferenceStatus, StateError> {
    match raw {
        "NotStarted" => Ok(ConferenceStatus::NotStarted),
        "InSession" => Ok(ConferenceStatus::InSession),
        "Paused" => Ok(ConferenceStatus::Paused),
        "Suspended" => Ok(ConferenceStatus::Suspended),
        "Closed" => Ok(ConferenceStatus::Closed),
        other => Err(StateError::Mapping(format!(
            "unknown conference status: {other}"
        ))),
    }
}

fn map_endpoint_status(raw: &str) -> Result<EndpointStatus, StateError> {
    match raw {
        "NotYetJoined" => Ok(EndpointStatus::NotYetJoined),
        "Connected" => Ok(EndpointStatus::Connected),
        "Disconnected" => Ok(EndpointStatus::Disconnected),
        "InConsultation" => Ok(EndpointStatus::InConsultation),
        other => Err(StateError::Mapping(format!(
            "unknown endpoint status: {other}"
        ))),
    }
}

fn map_layout(raw: &str) -> Result<HearingLayout, StateError> {
    match raw {
        "Dynamic" => Ok(HearingLayout::Dynamic),
        "OnePlus7" => Ok(HearingLayout::OnePlus7),
        "TwoPlus21" => Ok(HearingLayout::TwoPlus21),
        other => Err(StateError::Mapping(format!(
            "unknown hearing layout: {other}"
        ))),
    }
}
