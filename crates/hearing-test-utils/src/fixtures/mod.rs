//! Pre-configured upstream payloads for hearing state tests.
//!
//! Provides builders for the upstream conference/hearing detail pair the
//! conference cache maps into its aggregate.

use chrono::{TimeZone, Utc};
use hearing_state::conference::{
    map_conference, Conference, ConferenceDetails, EndpointDetails, HearingDetails,
    ParticipantDetails,
};
use hearing_state::config::Config;
use std::collections::HashMap;
use uuid::Uuid;

/// A layer config suitable for tests against the mock store.
///
/// # Panics
///
/// Panics if the baked-in variables fail validation - a test-utils bug.
#[must_use]
pub fn test_config() -> Config {
    test_config_with(|_| {})
}

/// A test config with extra environment overrides applied.
///
/// ```rust,ignore
/// let config = test_config_with(|vars| {
///     vars.insert("HEARING_LOCAL_CACHE_ENABLED".into(), "false".into());
/// });
/// ```
#[must_use]
pub fn test_config_with(customize: impl FnOnce(&mut HashMap<String, String>)) -> Config {
    let mut vars = HashMap::new();
    vars.insert(
        "REDIS_URL".to_string(),
        "redis://localhost:6379".to_string(),
    );
    customize(&mut vars);
    Config::from_vars(&vars).expect("test config should validate")
}

/// Builder for an upstream conference + hearing detail pair.
#[derive(Debug, Clone)]
pub struct TestConference {
    details: ConferenceDetails,
    hearing: HearingDetails,
}

impl Default for TestConference {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConference {
    /// A minimal not-started conference with no participants.
    #[must_use]
    pub fn new() -> Self {
        Self {
            details: ConferenceDetails {
                id: Uuid::new_v4(),
                hearing_id: Uuid::new_v4(),
                current_status: "NotStarted".to_string(),
                scheduled_date_time: Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap(),
                participants: vec![],
                endpoints: vec![],
                hearing_layout: None,
            },
            hearing: HearingDetails {
                case_number: "HT-2024-0001".to_string(),
                case_type: "Civil Money Claims".to_string(),
                hearing_venue_name: "Birmingham Civil Justice Centre".to_string(),
                created_date_time: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
                scheduled_duration_minutes: 45,
                is_scottish: false,
            },
        }
    }

    /// Pin the conference id.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.details.id = id;
        self
    }

    /// Set the upstream conference status string.
    #[must_use]
    pub fn with_status(mut self, status: &str) -> Self {
        self.details.current_status = status.to_string();
        self
    }

    /// Set the upstream layout string.
    #[must_use]
    pub fn with_layout(mut self, layout: &str) -> Self {
        self.details.hearing_layout = Some(layout.to_string());
        self
    }

    /// Set the case number.
    #[must_use]
    pub fn with_case_number(mut self, case_number: &str) -> Self {
        self.hearing.case_number = case_number.to_string();
        self
    }

    /// Add a participant with the given upstream role/status strings.
    #[must_use]
    pub fn with_participant(mut self, role: &str, status: &str) -> Self {
        let n = self.details.participants.len() + 1;
        self.details
            .participants
            .push(participant_details(role, status, n));
        self
    }

    /// Add an available judge.
    #[must_use]
    pub fn with_judge(self) -> Self {
        self.with_participant("Judge", "Available")
    }

    /// Add an available staff member.
    #[must_use]
    pub fn with_staff_member(self) -> Self {
        self.with_participant("StaffMember", "Available")
    }

    /// Add a not-signed-in individual.
    #[must_use]
    pub fn with_individual(self) -> Self {
        self.with_participant("Individual", "NotSignedIn")
    }

    /// Add an endpoint with the given upstream status string.
    #[must_use]
    pub fn with_endpoint(mut self, status: &str) -> Self {
        let n = self.details.endpoints.len() + 1;
        self.details.endpoints.push(EndpointDetails {
            id: Uuid::new_v4(),
            display_name: format!("Endpoint {n}"),
            status: status.to_string(),
            defence_advocate_username: None,
        });
        self
    }

    /// The upstream detail pair, as the injected fetch would return it.
    #[must_use]
    pub fn build(self) -> (ConferenceDetails, HearingDetails) {
        (self.details, self.hearing)
    }

    /// The mapped conference aggregate.
    ///
    /// # Panics
    ///
    /// Panics if the builder was given unmappable vocabulary - a test
    /// bug, not a runtime condition.
    #[must_use]
    pub fn conference(self) -> Conference {
        let (details, hearing) = self.build();
        map_conference(details, hearing).expect("fixture should map cleanly")
    }
}

/// An upstream participant record with plausible defaults.
#[must_use]
pub fn participant_details(role: &str, status: &str, n: usize) -> ParticipantDetails {
    ParticipantDetails {
        id: Uuid::new_v4(),
        username: format!("participant{n}@hearings.test"),
        display_name: format!("Participant {n}"),
        user_role: role.to_string(),
        hearing_role: "Litigant in person".to_string(),
        current_status: status.to_string(),
        current_room: None,
        linked_participants: vec![],
    }
}
