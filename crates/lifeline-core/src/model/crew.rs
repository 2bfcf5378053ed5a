// ── Crew domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;
use super::request::ServiceType;

/// Availability of a crew.
///
/// `Standby` is crewed but not taking dispatches; `Offline` is not
/// crewed at all. Only `Available` crews can be assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CrewStatus {
    Available,
    OnMission,
    Standby,
    Offline,
}

/// A response crew on the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crew {
    pub id: EntityId,
    pub name: String,
    /// Radio callsign, if the crew registered one.
    pub callsign: Option<String>,
    /// The ship the crew flies.
    pub ship: Option<String>,
    pub status: CrewStatus,
    /// Service categories this crew is equipped to handle.
    pub capabilities: Vec<ServiceType>,
    /// Last reported position, free text.
    pub location: Option<String>,
    /// Roster members, in seating order.
    pub members: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
}

impl Crew {
    /// Whether this crew can take a request of the given service type
    /// right now. A crew with an empty capability list is a generalist.
    pub fn can_serve(&self, service: ServiceType) -> bool {
        self.status == CrewStatus::Available
            && (self.capabilities.is_empty() || self.capabilities.contains(&service))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn crew(status: CrewStatus, capabilities: Vec<ServiceType>) -> Crew {
        Crew {
            id: EntityId::from("c1"),
            name: "Phoenix Squadron".into(),
            callsign: Some("Phoenix".into()),
            ship: Some("Cutlass Red".into()),
            status,
            capabilities,
            location: Some("Stanton".into()),
            members: vec![EntityId::from("u1")],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn available_crew_with_matching_capability_can_serve() {
        let c = crew(CrewStatus::Available, vec![ServiceType::Sar]);
        assert!(c.can_serve(ServiceType::Sar));
        assert!(!c.can_serve(ServiceType::Cargo));
    }

    #[test]
    fn generalist_crew_serves_anything_while_available() {
        let c = crew(CrewStatus::Available, vec![]);
        assert!(c.can_serve(ServiceType::Escort));
    }

    #[test]
    fn busy_or_parked_crew_cannot_serve() {
        for status in [CrewStatus::OnMission, CrewStatus::Standby, CrewStatus::Offline] {
            let c = crew(status, vec![ServiceType::Sar]);
            assert!(!c.can_serve(ServiceType::Sar));
        }
    }

    #[test]
    fn crew_status_wire_strings() {
        assert_eq!(serde_json::to_value(CrewStatus::OnMission).unwrap(), "on-mission");
        assert_eq!("standby".parse::<CrewStatus>().unwrap(), CrewStatus::Standby);
        assert_eq!("offline".parse::<CrewStatus>().unwrap(), CrewStatus::Offline);
    }
}
