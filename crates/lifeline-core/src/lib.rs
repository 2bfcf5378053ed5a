// lifeline-core: Reactive dispatch-board layer between lifeline-api and consumers.

pub mod board;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod notify;
pub mod session;
pub mod store;
pub mod stream;

mod presence;

// ── Primary re-exports ──────────────────────────────────────────────
pub use board::{ConnectionState, DispatchBoard};
// Wire-level types that appear in this crate's public API.
pub use lifeline_api::{AuthAttempt, OAuthConfig, StoreAdapter};
pub use command::{Command, CommandResult, CreateCrewInput, CreateRequestInput, CrewPatch};
pub use config::{BoardConfig, OAuthSettings, Operator};
pub use error::CoreError;
pub use notify::{Alert, AlertPermission, AlertSink};
pub use presence::HEARTBEAT_SECS;
pub use session::{Identity, SessionState};
pub use store::BoardStore;
pub use stream::{CrewFilter, EntityStream, PersonnelFilter, RequestFilter};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Core entities
    ActivityEntry, Crew, EntityId, Personnel, ServiceRequest,
    // Enumerations
    ActivityKind, CrewStatus, Priority, RequestStatus, Role, ServiceType,
};
