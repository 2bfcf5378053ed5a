// ── Row/domain conversion ──
//
// Wire rows carry string-typed enums; domain types are strongly typed.
// Row-to-domain is fallible: a row with an unknown status or service
// string is rejected here, and the refresh path drops it with a warning
// rather than poisoning the store. Domain-to-row is infallible and
// lossless, so a record can be echoed back to the backend verbatim.

use lifeline_api::rows::{ActivityRow, CrewRow, PersonnelRow, RequestRow};

use crate::error::CoreError;
use crate::model::{
    ActivityEntry, ActivityKind, Crew, CrewStatus, EntityId, Personnel, Priority, RequestStatus,
    Role, ServiceRequest, ServiceType,
};

fn bad_field(table: &str, field: &str, value: &str) -> CoreError {
    CoreError::ValidationFailed {
        message: format!("{table}: unrecognized {field} '{value}'"),
    }
}

impl TryFrom<RequestRow> for ServiceRequest {
    type Error = CoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let service: ServiceType = row
            .service
            .parse()
            .map_err(|_| bad_field("service_requests", "type", &row.service))?;
        let priority: Priority = row
            .priority
            .parse()
            .map_err(|_| bad_field("service_requests", "priority", &row.priority))?;
        let status: RequestStatus = row
            .status
            .parse()
            .map_err(|_| bad_field("service_requests", "status", &row.status))?;

        Ok(Self {
            id: EntityId::from(row.id),
            service,
            priority,
            location: row.location,
            description: row.description,
            status,
            requester_id: row.requester_id.map(EntityId::from),
            requester_name: row.requester_name,
            discord_username: row.discord_username,
            assigned_crew: row.assigned_crew_id.map(EntityId::from),
            dispatcher: row.dispatcher_id.map(EntityId::from),
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

impl From<&ServiceRequest> for RequestRow {
    fn from(request: &ServiceRequest) -> Self {
        Self {
            id: request.id.to_string(),
            service: request.service.to_string(),
            priority: request.priority.to_string(),
            location: request.location.clone(),
            description: request.description.clone(),
            status: request.status.to_string(),
            requester_id: request.requester_id.as_ref().map(ToString::to_string),
            requester_name: request.requester_name.clone(),
            discord_username: request.discord_username.clone(),
            assigned_crew_id: request.assigned_crew.as_ref().map(ToString::to_string),
            dispatcher_id: request.dispatcher.as_ref().map(ToString::to_string),
            created_at: request.created_at,
            completed_at: request.completed_at,
        }
    }
}

impl TryFrom<CrewRow> for Crew {
    type Error = CoreError;

    fn try_from(row: CrewRow) -> Result<Self, Self::Error> {
        let status: CrewStatus = row
            .status
            .parse()
            .map_err(|_| bad_field("crews", "status", &row.status))?;

        let capabilities = row
            .capabilities
            .iter()
            .map(|c| {
                c.parse::<ServiceType>()
                    .map_err(|_| bad_field("crews", "capability", c))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: EntityId::from(row.id),
            name: row.name,
            callsign: row.callsign,
            ship: row.ship,
            status,
            capabilities,
            location: row.location,
            members: row.members.into_iter().map(EntityId::from).collect(),
            created_at: row.created_at,
        })
    }
}

impl From<&Crew> for CrewRow {
    fn from(crew: &Crew) -> Self {
        Self {
            id: crew.id.to_string(),
            name: crew.name.clone(),
            callsign: crew.callsign.clone(),
            ship: crew.ship.clone(),
            status: crew.status.to_string(),
            capabilities: crew.capabilities.iter().map(ToString::to_string).collect(),
            location: crew.location.clone(),
            members: crew.members.iter().map(ToString::to_string).collect(),
            created_at: crew.created_at,
        }
    }
}

impl TryFrom<PersonnelRow> for Personnel {
    type Error = CoreError;

    fn try_from(row: PersonnelRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| bad_field("users", "role", &row.role))?;

        Ok(Self {
            id: EntityId::from(row.id),
            discord_id: row.discord_id,
            username: row.username,
            avatar_url: row.avatar_url,
            role,
            online: row.online,
            last_seen: row.last_seen,
            crew_id: row.crew_id.map(EntityId::from),
            created_at: row.created_at,
        })
    }
}

impl From<&Personnel> for PersonnelRow {
    fn from(person: &Personnel) -> Self {
        Self {
            id: person.id.to_string(),
            discord_id: person.discord_id.clone(),
            username: person.username.clone(),
            avatar_url: person.avatar_url.clone(),
            role: person.role.to_string(),
            online: person.online,
            last_seen: person.last_seen,
            crew_id: person.crew_id.as_ref().map(ToString::to_string),
            created_at: person.created_at,
        }
    }
}

impl TryFrom<ActivityRow> for ActivityEntry {
    type Error = CoreError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let kind: ActivityKind = row
            .kind
            .parse()
            .map_err(|_| bad_field("activity_log", "kind", &row.kind))?;

        Ok(Self {
            id: EntityId::from(row.id),
            kind,
            message: row.message,
            actor_name: row.actor_name,
            request: row.request_id.map(EntityId::from),
            created_at: row.created_at,
        })
    }
}

impl From<&ActivityEntry> for ActivityRow {
    fn from(entry: &ActivityEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind.to_string(),
            message: entry.message.clone(),
            actor_name: entry.actor_name.clone(),
            request_id: entry.request.as_ref().map(ToString::to_string),
            created_at: entry.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn request_row() -> RequestRow {
        RequestRow {
            id: "r1".into(),
            service: "SAR".into(),
            priority: "high".into(),
            location: "Daymar".into(),
            description: Some("Downed ship".into()),
            status: "in-progress".into(),
            requester_id: None,
            requester_name: "Eli Vance".into(),
            discord_username: Some("eli_vance".into()),
            assigned_crew_id: Some("c1".into()),
            dispatcher_id: Some("u1".into()),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn request_row_converts() {
        let request = ServiceRequest::try_from(request_row()).unwrap();
        assert_eq!(request.service, ServiceType::Sar);
        assert_eq!(request.priority, Priority::High);
        assert_eq!(request.status, RequestStatus::InProgress);
        assert_eq!(request.assigned_crew, Some(EntityId::from("c1")));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut row = request_row();
        row.status = "vaporized".into();
        assert!(matches!(
            ServiceRequest::try_from(row),
            Err(CoreError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn crew_row_converts_capabilities_and_members() {
        let row = CrewRow {
            id: "c1".into(),
            name: "Phoenix Squadron".into(),
            callsign: Some("Phoenix".into()),
            ship: Some("Cutlass Red".into()),
            status: "available".into(),
            capabilities: vec!["SAR".into(), "Medical".into()],
            location: Some("Stanton".into()),
            members: vec!["u1".into(), "u2".into()],
            created_at: Utc::now(),
        };

        let crew = Crew::try_from(row).unwrap();
        assert_eq!(crew.status, CrewStatus::Available);
        assert_eq!(
            crew.capabilities,
            vec![ServiceType::Sar, ServiceType::Medical]
        );
        assert_eq!(
            crew.members,
            vec![EntityId::from("u1"), EntityId::from("u2")]
        );
        assert_eq!(crew.callsign.as_deref(), Some("Phoenix"));
    }

    #[test]
    fn personnel_row_converts() {
        let row = PersonnelRow {
            id: "u1".into(),
            discord_id: "100000000000000001".into(),
            username: "Commander Reyes".into(),
            avatar_url: None,
            role: "dispatcher".into(),
            online: true,
            last_seen: None,
            crew_id: Some("c1".into()),
            created_at: Utc::now(),
        };

        let person = Personnel::try_from(row).unwrap();
        assert!(person.role.is_dispatcher());
        assert!(person.online);
        assert_eq!(person.crew_id, Some(EntityId::from("c1")));
    }

    #[test]
    fn request_round_trips_without_loss() {
        let row = request_row();
        let request = ServiceRequest::try_from(row.clone()).unwrap();
        let back = RequestRow::from(&request);

        assert_eq!(
            serde_json::to_value(&back).unwrap(),
            serde_json::to_value(&row).unwrap()
        );
    }

    #[test]
    fn crew_round_trips_without_loss() {
        let row = CrewRow {
            id: "c1".into(),
            name: "Phoenix Squadron".into(),
            callsign: Some("Phoenix".into()),
            ship: Some("Cutlass Red".into()),
            status: "on-mission".into(),
            capabilities: vec!["SAR".into(), "Medical".into()],
            location: Some("Stanton".into()),
            members: vec!["u1".into(), "u2".into()],
            created_at: Utc::now(),
        };

        let crew = Crew::try_from(row.clone()).unwrap();
        let back = CrewRow::from(&crew);

        assert_eq!(back.capabilities, vec!["SAR", "Medical"]);
        assert_eq!(
            serde_json::to_value(&back).unwrap(),
            serde_json::to_value(&row).unwrap()
        );
    }

    #[test]
    fn personnel_and_activity_round_trip_without_loss() {
        let person_row = PersonnelRow {
            id: "u1".into(),
            discord_id: "100000000000000001".into(),
            username: "Commander Reyes".into(),
            avatar_url: Some("https://cdn.example/avatar.png".into()),
            role: "dispatcher".into(),
            online: true,
            last_seen: Some(Utc::now()),
            crew_id: Some("c1".into()),
            created_at: Utc::now(),
        };
        let person = Personnel::try_from(person_row.clone()).unwrap();
        assert_eq!(
            serde_json::to_value(PersonnelRow::from(&person)).unwrap(),
            serde_json::to_value(&person_row).unwrap()
        );

        let activity_row = ActivityRow {
            id: "a1".into(),
            kind: "status_changed".into(),
            message: "Request moved to in-progress".into(),
            actor_name: "Commander Reyes".into(),
            request_id: Some("r1".into()),
            created_at: Utc::now(),
        };
        let entry = ActivityEntry::try_from(activity_row.clone()).unwrap();
        assert_eq!(
            serde_json::to_value(ActivityRow::from(&entry)).unwrap(),
            serde_json::to_value(&activity_row).unwrap()
        );
    }

    #[test]
    fn activity_row_converts() {
        let row = ActivityRow {
            id: "a1".into(),
            kind: "crew_assigned".into(),
            message: "Phoenix Squadron assigned to SAR at Daymar".into(),
            actor_name: "Commander Reyes".into(),
            request_id: Some("r1".into()),
            created_at: Utc::now(),
        };

        let entry = ActivityEntry::try_from(row).unwrap();
        assert_eq!(entry.kind, ActivityKind::CrewAssigned);
        assert_eq!(entry.request, Some(EntityId::from("r1")));
    }
}
