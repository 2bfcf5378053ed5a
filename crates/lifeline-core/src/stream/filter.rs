// ── Filter predicates for entity streams ──
//
// Used by the CLI to filter snapshots without re-querying the backend.

use crate::model::{
    Crew, CrewStatus, EntityId, Personnel, Priority, RequestStatus, Role, ServiceRequest,
    ServiceType,
};

/// Filter predicate for request collections.
pub enum RequestFilter {
    All,
    /// Any non-terminal status.
    Active,
    ByStatus(RequestStatus),
    ByService(ServiceType),
    /// This priority or higher.
    MinPriority(Priority),
    ByCrew(EntityId),
    Custom(Box<dyn Fn(&ServiceRequest) -> bool + Send + Sync>),
}

impl RequestFilter {
    pub fn matches(&self, request: &ServiceRequest) -> bool {
        match self {
            Self::All => true,
            Self::Active => request.status.is_active(),
            Self::ByStatus(status) => request.status == *status,
            Self::ByService(service) => request.service == *service,
            Self::MinPriority(min) => request.priority >= *min,
            Self::ByCrew(crew_id) => request.assigned_crew.as_ref() == Some(crew_id),
            Self::Custom(f) => f(request),
        }
    }
}

/// Filter predicate for crew collections.
pub enum CrewFilter {
    All,
    ByStatus(CrewStatus),
    Available,
    /// Can take a request of this service type right now.
    CanServe(ServiceType),
    Custom(Box<dyn Fn(&Crew) -> bool + Send + Sync>),
}

impl CrewFilter {
    pub fn matches(&self, crew: &Crew) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => crew.status == *status,
            Self::Available => crew.status == CrewStatus::Available,
            Self::CanServe(service) => crew.can_serve(*service),
            Self::Custom(f) => f(crew),
        }
    }
}

/// Filter predicate for personnel collections.
pub enum PersonnelFilter {
    All,
    ByRole(Role),
    Dispatchers,
    /// Currently online per the presence tracker.
    Online,
    Custom(Box<dyn Fn(&Personnel) -> bool + Send + Sync>),
}

impl PersonnelFilter {
    pub fn matches(&self, person: &Personnel) -> bool {
        match self {
            Self::All => true,
            Self::ByRole(role) => person.role == *role,
            Self::Dispatchers => person.role.is_dispatcher(),
            Self::Online => person.online,
            Self::Custom(f) => f(person),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(status: RequestStatus, priority: Priority) -> ServiceRequest {
        ServiceRequest {
            id: EntityId::from("r1"),
            service: ServiceType::Sar,
            priority,
            location: "Daymar".into(),
            description: None,
            status,
            requester_id: None,
            requester_name: "Eli".into(),
            discord_username: None,
            assigned_crew: Some(EntityId::from("c1")),
            dispatcher: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn active_filter_excludes_terminal_states() {
        let filter = RequestFilter::Active;
        assert!(filter.matches(&request(RequestStatus::Pending, Priority::Low)));
        assert!(filter.matches(&request(RequestStatus::InProgress, Priority::Low)));
        assert!(!filter.matches(&request(RequestStatus::Completed, Priority::Low)));
        assert!(!filter.matches(&request(RequestStatus::Cancelled, Priority::Low)));
    }

    #[test]
    fn min_priority_is_inclusive() {
        let filter = RequestFilter::MinPriority(Priority::High);
        assert!(filter.matches(&request(RequestStatus::Pending, Priority::High)));
        assert!(filter.matches(&request(RequestStatus::Pending, Priority::Critical)));
        assert!(!filter.matches(&request(RequestStatus::Pending, Priority::Medium)));
    }

    #[test]
    fn online_filter_tracks_presence() {
        let person = Personnel {
            id: EntityId::from("u1"),
            discord_id: "100000000000000001".into(),
            username: "Reyes".into(),
            avatar_url: None,
            role: Role::Dispatcher,
            online: true,
            last_seen: Some(Utc::now()),
            crew_id: None,
            created_at: Utc::now(),
        };
        assert!(PersonnelFilter::Online.matches(&person));

        let offline = Personnel {
            online: false,
            ..person
        };
        assert!(!PersonnelFilter::Online.matches(&offline));
    }

    #[test]
    fn by_crew_matches_assignment() {
        let filter = RequestFilter::ByCrew(EntityId::from("c1"));
        assert!(filter.matches(&request(RequestStatus::Assigned, Priority::Low)));

        let other = RequestFilter::ByCrew(EntityId::from("c2"));
        assert!(!other.matches(&request(RequestStatus::Assigned, Priority::Low)));
    }
}
