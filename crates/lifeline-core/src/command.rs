// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The board
// routes each variant through the store adapter, records the matching
// activity entry, and re-fetches the affected tables.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Crew, CrewStatus, EntityId, Priority, RequestStatus, ServiceRequest, ServiceType};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

// ── Typed inputs ─────────────────────────────────────────────────────

/// Payload for submitting a new service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequestInput {
    pub service: ServiceType,
    pub priority: Priority,
    pub location: String,
    pub description: String,
    /// Submit on behalf of a named citizen. Defaults to the signed-in
    /// operator's username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
    /// Discord handle the requester can be reached on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_username: Option<String>,
}

impl CreateRequestInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.location.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "request location must not be empty".into(),
            });
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "request description must not be empty".into(),
            });
        }
        if self.requester.as_ref().is_some_and(|r| r.trim().is_empty()) {
            return Err(CoreError::ValidationFailed {
                message: "requester name must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Payload for registering a new crew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCrewInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship: Option<String>,
    pub capabilities: Vec<ServiceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Personnel ids riding with the crew, in seating order.
    pub members: Vec<EntityId>,
}

impl CreateCrewInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "crew name must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Partial update for a crew. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CrewStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<ServiceType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<EntityId>>,
}

impl CrewPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.callsign.is_none()
            && self.ship.is_none()
            && self.status.is_none()
            && self.capabilities.is_none()
            && self.location.is_none()
            && self.members.is_none()
    }
}

// ── Command ──────────────────────────────────────────────────────────

/// All possible write operations against the dispatch board.
#[derive(Debug, Clone)]
pub enum Command {
    /// Submit a new service request. Open to every role.
    CreateRequest(CreateRequestInput),

    /// Assign a crew to a pending request. Dispatcher only.
    AssignCrew {
        request: EntityId,
        crew: EntityId,
    },

    /// Move a request through its lifecycle. Dispatcher only.
    UpdateRequestStatus {
        request: EntityId,
        status: RequestStatus,
    },

    /// Register a new crew. Dispatcher only.
    CreateCrew(CreateCrewInput),

    /// Patch an existing crew. Dispatcher only.
    UpdateCrew {
        crew: EntityId,
        patch: CrewPatch,
    },
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    Request(ServiceRequest),
    Crew(Crew),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request_input() -> CreateRequestInput {
        CreateRequestInput {
            service: ServiceType::Sar,
            priority: Priority::High,
            location: "Daymar".into(),
            description: "stranded pilot".into(),
            requester: None,
            discord_username: None,
        }
    }

    #[test]
    fn complete_request_input_passes_validation() {
        assert!(request_input().validate().is_ok());
    }

    #[test]
    fn empty_location_fails_validation() {
        let mut input = request_input();
        input.location = "   ".into();
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_description_fails_validation() {
        let mut input = request_input();
        input.description = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn blank_requester_override_fails_validation() {
        let mut input = request_input();
        input.requester = Some("  ".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_crew_name_fails_validation() {
        let input = CreateCrewInput {
            name: String::new(),
            callsign: None,
            ship: None,
            capabilities: vec![],
            location: None,
            members: vec![],
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn default_crew_patch_is_empty() {
        assert!(CrewPatch::default().is_empty());
        let patch = CrewPatch {
            status: Some(CrewStatus::Standby),
            ..CrewPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
