//! Shared helpers for command handlers.

use std::sync::Arc;

use lifeline_core::{Crew, DispatchBoard, EntityId};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Crew display name for an assignment column, falling back to the raw id.
pub fn crew_name(crews: &[Arc<Crew>], id: Option<&EntityId>) -> String {
    let Some(id) = id else {
        return String::new();
    };
    crews
        .iter()
        .find(|c| &c.id == id)
        .map_or_else(|| id.to_string(), |c| c.name.clone())
}

/// Resolve a request identifier against the snapshot so typos fail fast
/// with a list hint instead of a round trip to the backend.
pub fn resolve_request_id(board: &DispatchBoard, identifier: &str) -> Result<EntityId, CliError> {
    let snap = board.requests();
    for request in snap.current().iter() {
        if request.id.to_string() == identifier {
            return Ok(request.id.clone());
        }
    }
    Err(CliError::NotFound {
        resource_type: "request".into(),
        identifier: identifier.into(),
        list_command: "requests list".into(),
    })
}

/// Resolve a crew identifier (id or exact name) against the snapshot.
pub fn resolve_crew_id(board: &DispatchBoard, identifier: &str) -> Result<EntityId, CliError> {
    let snap = board.crews();
    for crew in snap.current().iter() {
        if crew.id.to_string() == identifier || crew.name == identifier {
            return Ok(crew.id.clone());
        }
    }
    Err(CliError::NotFound {
        resource_type: "crew".into(),
        identifier: identifier.into(),
        list_command: "crews list".into(),
    })
}
