// ── Service request domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;

/// The category of service a citizen is asking for.
///
/// Wire values are the backend's exact strings (`"SAR"`, `"Medical"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum ServiceType {
    #[serde(rename = "SAR")]
    #[strum(serialize = "SAR")]
    Sar,
    #[serde(rename = "CSAR")]
    #[strum(serialize = "CSAR")]
    Csar,
    Refueling,
    Medical,
    Escort,
    Cargo,
}

impl ServiceType {
    /// Human-readable label for boards and notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sar => "Search & Rescue",
            Self::Csar => "Combat Search & Rescue",
            Self::Refueling => "Refueling",
            Self::Medical => "Medical",
            Self::Escort => "Escort",
            Self::Cargo => "Cargo",
        }
    }
}

/// Urgency of a request. Ordering follows declaration:
/// `Low < Medium < High < Critical`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle state of a service request.
///
/// `pending → assigned → in-progress → completed`, with `cancelled`
/// reachable from any non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// Whether the request still occupies the active board.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Assigned | Self::InProgress)
    }

    /// Whether the request has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// The canonical service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: EntityId,
    pub service: ServiceType,
    pub priority: Priority,
    pub location: String,
    pub description: Option<String>,
    pub status: RequestStatus,

    // Who asked, who answered
    pub requester_id: Option<EntityId>,
    pub requester_name: String,
    /// Discord handle the requester left for contact, if any.
    pub discord_username: Option<String>,
    pub assigned_crew: Option<EntityId>,
    pub dispatcher: Option<EntityId>,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn status_activity_partition() {
        assert!(RequestStatus::Pending.is_active());
        assert!(RequestStatus::InProgress.is_active());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(!RequestStatus::Assigned.is_terminal());
    }

    #[test]
    fn service_type_wire_strings() {
        assert_eq!(serde_json::to_value(ServiceType::Sar).unwrap(), "SAR");
        assert_eq!(serde_json::to_value(ServiceType::Csar).unwrap(), "CSAR");
        assert_eq!(serde_json::to_value(ServiceType::Refueling).unwrap(), "Refueling");
    }

    #[test]
    fn request_status_wire_strings() {
        assert_eq!(
            serde_json::to_value(RequestStatus::InProgress).unwrap(),
            "in-progress"
        );
        assert_eq!(RequestStatus::InProgress.to_string(), "in-progress");
        assert_eq!("in-progress".parse::<RequestStatus>().unwrap(), RequestStatus::InProgress);
    }
}
