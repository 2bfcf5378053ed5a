// ── Domain model ──
//
// Strongly-typed records for the four dispatch entities, plus the
// EntityId they all key on. Wire rows live in `lifeline-api`; the
// `convert` module translates between the two.

mod activity;
mod crew;
mod entity_id;
mod personnel;
mod request;

pub use activity::{ActivityEntry, ActivityKind};
pub use crew::{Crew, CrewStatus};
pub use entity_id::EntityId;
pub use personnel::{Personnel, Role};
pub use request::{Priority, RequestStatus, ServiceRequest, ServiceType};
