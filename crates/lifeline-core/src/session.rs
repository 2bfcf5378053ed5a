// ── Session state machine ──
//
// Sign-in status observable by consumers over a `watch` channel.
// `LoggingOut` is an explicit state, not a side flag: presence writes
// and other background effects check the state they observe, so a
// sign-out in progress cannot race a heartbeat back into the backend.

use crate::model::{EntityId, Role};

/// The signed-in operator, resolved against the personnel roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Roster row id, when the operator matched one.
    pub personnel_id: Option<EntityId>,
    pub discord_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn is_dispatcher(&self) -> bool {
        self.role.is_dispatcher()
    }
}

/// Session lifecycle:
///
/// ```text
/// Anonymous ─→ Authenticating ─→ Authenticated ─→ LoggingOut ─→ Anonymous
///     ↑              │
///     └──── error ───┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Signed out. Carries the error that ended the previous attempt, if any.
    #[default]
    Anonymous,
    AnonymousWithError {
        message: String,
    },
    /// OAuth round-trip in flight.
    Authenticating,
    Authenticated(Identity),
    /// Sign-out in progress. Background effects must treat this as
    /// signed out already.
    LoggingOut,
}

impl SessionState {
    /// The identity, if the session is live.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether presence heartbeats and other authenticated background
    /// writes are allowed right now.
    pub fn allows_presence(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            personnel_id: Some(EntityId::from("u1")),
            discord_id: "100000000000000001".into(),
            username: "Commander Reyes".into(),
            avatar_url: None,
            role,
        }
    }

    #[test]
    fn only_authenticated_allows_presence() {
        assert!(SessionState::Authenticated(identity(Role::Pilot)).allows_presence());
        assert!(!SessionState::Anonymous.allows_presence());
        assert!(!SessionState::Authenticating.allows_presence());
        assert!(!SessionState::LoggingOut.allows_presence());
    }

    #[test]
    fn identity_accessor() {
        let state = SessionState::Authenticated(identity(Role::Dispatcher));
        assert!(state.identity().unwrap().is_dispatcher());
        assert!(SessionState::LoggingOut.identity().is_none());
    }
}
