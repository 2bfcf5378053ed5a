//! Wire-level row types for the four backend tables.
//!
//! These mirror the backend column names exactly (snake_case, string
//! enums). `lifeline-core` converts them into the strongly-typed domain
//! model; nothing outside the api crate should build on these directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Tables ───────────────────────────────────────────────────────────

/// The backend tables Lifeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Requests,
    Crews,
    Personnel,
    Activity,
}

impl Table {
    /// The backend table name, as it appears in REST paths and feed frames.
    pub fn name(self) -> &'static str {
        match self {
            Self::Requests => "service_requests",
            Self::Crews => "crews",
            Self::Personnel => "users",
            Self::Activity => "activity_log",
        }
    }

    /// Parse a table name from a feed frame. Unknown tables return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "service_requests" => Some(Self::Requests),
            "crews" => Some(Self::Crews),
            "users" => Some(Self::Personnel),
            "activity_log" => Some(Self::Activity),
            _ => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── service_requests ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRow {
    pub id: String,
    /// Service category. The column is named `type` on the backend.
    #[serde(rename = "type")]
    pub service: String,
    pub priority: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub requester_id: Option<String>,
    pub requester_name: String,
    #[serde(default)]
    pub discord_username: Option<String>,
    #[serde(default)]
    pub assigned_crew_id: Option<String>,
    #[serde(default)]
    pub dispatcher_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new service request. The backend fills `id`
/// and `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInsert {
    #[serde(rename = "type")]
    pub service: String,
    pub priority: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,
    pub requester_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_username: Option<String>,
}

// ── crews ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub ship: Option<String>,
    pub status: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Personnel ids, in seating order.
    #[serde(default)]
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrewInsert {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship: Option<String>,
    pub status: String,
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub members: Vec<String>,
}

// ── users ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelRow {
    pub id: String,
    pub discord_id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub role: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub crew_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonnelInsert {
    pub discord_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: String,
    pub online: bool,
}

// ── activity_log ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: String,
    pub kind: String,
    pub message: String,
    pub actor_name: String,
    #[serde(default)]
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityInsert {
    pub kind: String,
    pub message: String,
    pub actor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_names_round_trip() {
        for table in [Table::Requests, Table::Crews, Table::Personnel, Table::Activity] {
            assert_eq!(Table::from_name(table.name()), Some(table));
        }
        assert_eq!(Table::from_name("nonsense"), None);
    }

    #[test]
    fn request_row_maps_type_column() {
        let json = serde_json::json!({
            "id": "r1",
            "type": "SAR",
            "priority": "high",
            "location": "Daymar",
            "description": "Crash site near Shubin",
            "status": "pending",
            "requester_name": "Eli Vance",
            "created_at": "2026-02-10T12:00:00Z"
        });

        let row: RequestRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.service, "SAR");
        assert!(row.assigned_crew_id.is_none());
        assert!(row.completed_at.is_none());
    }

    #[test]
    fn request_insert_serializes_type_and_skips_empty_options() {
        let insert = RequestInsert {
            service: "Medical".into(),
            priority: "critical".into(),
            location: "Lorville".into(),
            description: None,
            status: "pending".into(),
            requester_id: None,
            requester_name: "Ada".into(),
            discord_username: None,
        };

        let value = serde_json::to_value(&insert).unwrap();
        assert_eq!(value["type"], "Medical");
        assert!(value.get("description").is_none());
        assert!(value.get("requester_id").is_none());
    }
}
