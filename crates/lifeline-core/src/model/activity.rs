// ── Activity log domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

/// What kind of board event an activity entry records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityKind {
    RequestCreated,
    CrewAssigned,
    StatusChanged,
    CrewCreated,
    CrewUpdated,
}

/// One line in the audit trail. Append-only; entries are never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: EntityId,
    pub kind: ActivityKind,
    pub message: String,
    pub actor_name: String,
    /// The request this entry concerns, when there is one.
    pub request: Option<EntityId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn activity_kind_wire_strings() {
        assert_eq!(
            serde_json::to_value(ActivityKind::CrewAssigned).unwrap(),
            "crew_assigned"
        );
        assert_eq!(
            "request_created".parse::<ActivityKind>().unwrap(),
            ActivityKind::RequestCreated
        );
    }
}
