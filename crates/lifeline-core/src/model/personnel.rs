// ── Personnel domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;

/// What a person is allowed to do on the board.
///
/// Only dispatchers may assign crews or move requests through their
/// lifecycle. Everyone may submit requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Dispatcher,
    Pilot,
    Crew,
}

impl Role {
    pub fn is_dispatcher(self) -> bool {
        self == Self::Dispatcher
    }
}

/// A person on the roster, identified by their Discord account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personnel {
    pub id: EntityId,
    pub discord_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    /// Kept current by the presence heartbeat while the person's client
    /// is foregrounded; flipped off on background, logout, or unload.
    pub online: bool,
    /// Last presence heartbeat, if the person has ever been seen online.
    pub last_seen: Option<DateTime<Utc>>,
    /// The crew this person rides with, if any.
    pub crew_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_strings() {
        assert_eq!(serde_json::to_value(Role::Dispatcher).unwrap(), "dispatcher");
        assert_eq!("pilot".parse::<Role>().unwrap(), Role::Pilot);
    }

    #[test]
    fn only_dispatcher_is_dispatcher() {
        assert!(Role::Dispatcher.is_dispatcher());
        assert!(!Role::Pilot.is_dispatcher());
        assert!(!Role::Crew.is_dispatcher());
    }
}
