//! Conference aggregate and participant/endpoint records.
//!
//! All types here are persisted through the distributed cache, so their
//! collection fields carry `#[serde(default)]` - entries written under an
//! older schema decode with those fields empty instead of failing.

use crate::errors::StateError;
use crate::layout::HearingLayout;
use chrono::{DateTime, Utc};
use common::types::{ConferenceId, EndpointId, HearingId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle state of a conference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConferenceStatus {
    NotStarted,
    InSession,
    Paused,
    Suspended,
    Closed,
}

/// Role a participant holds in the hearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantRole {
    Judge,
    StaffMember,
    JudicialOfficeHolder,
    Individual,
    Representative,
    QuickLinkParticipant,
    QuickLinkObserver,
}

/// Connection/consultation state of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    NotSignedIn,
    Joining,
    Available,
    InHearing,
    InConsultation,
    Disconnected,
}

/// Connection state of a video endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointStatus {
    NotYetJoined,
    Connected,
    Disconnected,
    InConsultation,
}

/// The consultation room a participant currently occupies, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRoom {
    /// Room label, e.g. "ParticipantConsultationRoom1".
    pub label: String,
    /// Whether the room is locked to new joiners.
    #[serde(default)]
    pub locked: bool,
}

/// A participant in a conference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: String,
    pub display_name: String,
    pub role: ParticipantRole,
    /// Free-text role from the booking (e.g. "Applicant", "Witness").
    pub hearing_role: String,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub current_room: Option<ConsultationRoom>,
    /// Participants whose consultation answers are linked to this one
    /// (e.g. an interpreter and the person they interpret for).
    #[serde(default)]
    pub linked_participants: Vec<ParticipantId>,
}

impl Participant {
    /// Whether this participant runs the hearing (judge or staff member).
    /// Hosts are the audience for layout-change notifications.
    #[must_use]
    pub fn is_host(&self) -> bool {
        matches!(
            self.role,
            ParticipantRole::Judge | ParticipantRole::StaffMember
        )
    }
}

/// A video endpoint joined to a conference (e.g. a prison video link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EndpointId,
    pub display_name: String,
    pub status: EndpointStatus,
    #[serde(default)]
    pub defence_advocate_username: Option<String>,
}

/// Cached snapshot of one scheduled hearing session.
///
/// `id` is globally unique and immutable once set. The participant and
/// endpoint lists may be replaced wholesale on update but never contain
/// duplicate ids - use [`Conference::replace_participants`] /
/// [`Conference::replace_endpoints`] which enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub id: ConferenceId,
    pub hearing_id: HearingId,
    pub case_number: String,
    pub case_type: String,
    pub scheduled_datetime: DateTime<Utc>,
    pub created_datetime: DateTime<Utc>,
    pub scheduled_duration_minutes: u32,
    pub hearing_venue_name: String,
    pub status: ConferenceStatus,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Current on-screen layout selection, if one has been chosen.
    #[serde(default)]
    pub hearing_layout: Option<HearingLayout>,
    #[serde(default)]
    pub is_scottish: bool,
}

impl Conference {
    /// Look up a participant by id.
    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// The judge and staff-member participants.
    pub fn host_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_host())
    }

    /// Update a participant's status in place.
    ///
    /// # Errors
    ///
    /// `StateError::ParticipantNotFound` if the id is not in this
    /// conference.
    pub fn update_participant_status(
        &mut self,
        id: ParticipantId,
        status: ParticipantStatus,
    ) -> Result<(), StateError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StateError::ParticipantNotFound(id))?;
        participant.status = status;
        Ok(())
    }

    /// Replace the participant list wholesale.
    ///
    /// # Errors
    ///
    /// `StateError::Validation` if the new list contains duplicate ids.
    pub fn replace_participants(
        &mut self,
        participants: Vec<Participant>,
    ) -> Result<(), StateError> {
        ensure_unique(participants.iter().map(|p| p.id), "participant")?;
        self.participants = participants;
        Ok(())
    }

    /// Replace the endpoint list wholesale.
    ///
    /// # Errors
    ///
    /// `StateError::Validation` if the new list contains duplicate ids.
    pub fn replace_endpoints(&mut self, endpoints: Vec<Endpoint>) -> Result<(), StateError> {
        ensure_unique(endpoints.iter().map(|e| e.id), "endpoint")?;
        self.endpoints = endpoints;
        Ok(())
    }
}

pub(crate) fn ensure_unique<I, T>(ids: I, what: &str) -> Result<(), StateError>
where
    I: Iterator<Item = T>,
    T: std::hash::Hash + Eq + std::fmt::Display + Copy,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StateError::Validation(format!("duplicate {what} id: {id}")));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn participant(role: ParticipantRole) -> Participant {
        Participant {
            id: ParticipantId::new(),
            username: "user@hearings.test".to_string(),
            display_name: "Test User".to_string(),
            role,
            hearing_role: "Litigant".to_string(),
            status: ParticipantStatus::Available,
            current_room: None,
            linked_participants: vec![],
        }
    }

    fn conference() -> Conference {
        Conference {
            id: ConferenceId::new(),
            hearing_id: HearingId::new(),
            case_number: "HT-2024-0001".to_string(),
            case_type: "Civil Money Claims".to_string(),
            scheduled_datetime: Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap(),
            created_datetime: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            scheduled_duration_minutes: 45,
            hearing_venue_name: "Birmingham Civil Justice Centre".to_string(),
            status: ConferenceStatus::NotStarted,
            participants: vec![
                participant(ParticipantRole::Judge),
                participant(ParticipantRole::Individual),
                participant(ParticipantRole::StaffMember),
            ],
            endpoints: vec![],
            hearing_layout: None,
            is_scottish: false,
        }
    }

    #[test]
    fn test_host_participants_are_judge_and_staff() {
        let conference = conference();
        let hosts: Vec<_> = conference.host_participants().collect();

        assert_eq!(hosts.len(), 2);
        assert!(hosts
            .iter()
            .all(|p| matches!(p.role, ParticipantRole::Judge | ParticipantRole::StaffMember)));
    }

    #[test]
    fn test_update_participant_status() {
        let mut conference = conference();
        let id = conference.participants.first().unwrap().id;

        conference
            .update_participant_status(id, ParticipantStatus::InConsultation)
            .unwrap();

        assert_eq!(
            conference.participant(id).unwrap().status,
            ParticipantStatus::InConsultation
        );
    }

    #[test]
    fn test_update_unknown_participant_is_typed_error() {
        let mut conference = conference();
        let unknown = ParticipantId::new();

        let result = conference.update_participant_status(unknown, ParticipantStatus::Available);
        assert!(matches!(result, Err(StateError::ParticipantNotFound(id)) if id == unknown));
    }

    #[test]
    fn test_replace_participants_rejects_duplicates() {
        let mut conference = conference();
        let dup = participant(ParticipantRole::Individual);

        let result = conference.replace_participants(vec![dup.clone(), dup]);
        assert!(matches!(result, Err(StateError::Validation(_))));
    }

    #[test]
    fn test_decodes_entry_missing_optional_fields() {
        // An entry written before endpoints/layout existed in the schema.
        let conference = conference();
        let mut json: serde_json::Value = serde_json::to_value(&conference).unwrap();
        let obj = json.as_object_mut().unwrap();
        obj.remove("endpoints");
        obj.remove("hearing_layout");
        obj.remove("is_scottish");

        let decoded: Conference = serde_json::from_value(json).unwrap();
        assert!(decoded.endpoints.is_empty());
        assert!(decoded.hearing_layout.is_none());
        assert!(!decoded.is_scottish);
    }

    #[test]
    fn test_enum_fields_encode_as_strings() {
        let conference = conference();
        let json = serde_json::to_string(&conference).unwrap();

        assert!(json.contains("\"status\":\"NotStarted\""));
        assert!(json.contains("\"role\":\"Judge\""));
    }
}
