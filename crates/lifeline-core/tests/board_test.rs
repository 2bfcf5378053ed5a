//! End-to-end dispatch flow over the in-memory backend.
//!
//! Exercises the same code paths production uses, minus the network:
//! connect, sign in, submit a request, assign a crew, walk the request
//! through its lifecycle, and verify the store and audit trail.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lifeline_api::{MemoryStore, StoreAdapter};
use lifeline_core::{
    ActivityKind, BoardConfig, Command, CommandResult, ConnectionState, CoreError, CreateCrewInput,
    CreateRequestInput, CrewPatch, CrewStatus, DispatchBoard, EntityId, Operator, Priority,
    RequestStatus, Role, ServiceType,
};

fn dispatcher_operator() -> Operator {
    // Matches the roster row seeded by the demo fixtures.
    Operator {
        name: "Commander Reyes".into(),
        discord_id: "100000000000000001".into(),
        avatar_url: None,
    }
}

fn config(operator: Option<Operator>) -> BoardConfig {
    BoardConfig {
        backend_url: Url::parse("http://board.invalid/").unwrap(),
        api_key: SecretString::from("demo"),
        feed_enabled: false,
        refresh_interval_secs: 0,
        timeout: Duration::from_secs(5),
        oauth: None,
        operator,
    }
}

async fn connected_board(operator: Option<Operator>) -> DispatchBoard {
    let adapter = StoreAdapter::memory(MemoryStore::with_demo_fixtures());
    let board = DispatchBoard::with_adapter(config(operator), adapter);
    board.connect().await.unwrap();
    board
}

#[tokio::test]
async fn connect_loads_fixture_data() {
    let board = connected_board(None).await;

    let store = board.store();
    assert_eq!(store.request_count(), 2);
    assert_eq!(store.crew_count(), 2);
    assert_eq!(store.personnel_count(), 1);
    assert_eq!(store.pending_request_count(), 2);
    assert!(store.last_full_refresh().is_some());

    board.disconnect().await;
    let state = board.connection_state().borrow().clone();
    assert_eq!(state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn sign_in_resolves_roster_role() {
    let board = connected_board(Some(dispatcher_operator())).await;

    let identity = board.sign_in().unwrap();
    assert_eq!(identity.role, Role::Dispatcher);
    assert_eq!(identity.personnel_id, Some(EntityId::from("u1")));

    board.disconnect().await;
}

#[tokio::test]
async fn unknown_operator_gets_least_privilege() {
    let board = connected_board(Some(Operator {
        name: "Drifter".into(),
        discord_id: "999999999999999999".into(),
        avatar_url: None,
    }))
    .await;

    let identity = board.sign_in().unwrap();
    assert_eq!(identity.role, Role::Crew);
    assert!(identity.personnel_id.is_none());

    board.disconnect().await;
}

#[tokio::test]
async fn submitted_request_lands_pending() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    let result = board
        .execute(Command::CreateRequest(CreateRequestInput {
            service: ServiceType::Medical,
            priority: Priority::Critical,
            location: "Lorville".into(),
            description: "Two injured after a vehicle rollover".into(),
            requester: None,
            discord_username: None,
        }))
        .await
        .unwrap();

    let CommandResult::Request(request) = result else {
        panic!("expected a request back");
    };
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.requester_name, "Commander Reyes");
    assert!(request.assigned_crew.is_none());

    let store = board.store();
    assert_eq!(store.request_count(), 3);
    assert_eq!(store.pending_request_count(), 3);

    // Newest first
    let snapshot = store.requests_snapshot();
    assert_eq!(snapshot[0].location, "Lorville");

    let activity = store.activity_snapshot();
    assert_eq!(activity[0].kind, ActivityKind::RequestCreated);
    assert_eq!(activity[0].actor_name, "Commander Reyes");
    assert_eq!(activity[0].request, Some(request.id.clone()));

    board.disconnect().await;
}

#[tokio::test]
async fn empty_location_is_rejected() {
    let board = connected_board(None).await;

    let err = board
        .execute(Command::CreateRequest(CreateRequestInput {
            service: ServiceType::Cargo,
            priority: Priority::Low,
            location: "  ".into(),
            description: "Forty crates of agricultural supplies".into(),
            requester: None,
            discord_username: None,
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(board.store().request_count(), 2);

    board.disconnect().await;
}

#[tokio::test]
async fn assign_crew_marks_both_sides() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    board
        .execute(Command::AssignCrew {
            request: EntityId::from("r1"),
            crew: EntityId::from("c1"),
        })
        .await
        .unwrap();

    let store = board.store();
    let request = store.request_by_id(&EntityId::from("r1")).unwrap();
    assert_eq!(request.status, RequestStatus::Assigned);
    assert_eq!(request.assigned_crew, Some(EntityId::from("c1")));
    assert_eq!(request.dispatcher, Some(EntityId::from("u1")));

    let crew = store.crew_by_id(&EntityId::from("c1")).unwrap();
    assert_eq!(crew.status, CrewStatus::OnMission);

    let activity = store.activity_snapshot();
    assert_eq!(activity[0].kind, ActivityKind::CrewAssigned);

    board.disconnect().await;
}

#[tokio::test]
async fn assignment_requires_dispatcher_role() {
    let board = connected_board(Some(Operator {
        name: "Drifter".into(),
        discord_id: "999999999999999999".into(),
        avatar_url: None,
    }))
    .await;
    board.sign_in().unwrap();

    let err = board
        .execute(Command::AssignCrew {
            request: EntityId::from("r1"),
            crew: EntityId::from("c1"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Forbidden { .. }));

    let request = board.store().request_by_id(&EntityId::from("r1")).unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    board.disconnect().await;
}

#[tokio::test]
async fn busy_crew_cannot_be_assigned() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    board
        .execute(Command::AssignCrew {
            request: EntityId::from("r1"),
            crew: EntityId::from("c1"),
        })
        .await
        .unwrap();

    let err = board
        .execute(Command::AssignCrew {
            request: EntityId::from("r2"),
            crew: EntityId::from("c1"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    board.disconnect().await;
}

#[tokio::test]
async fn completed_request_frees_its_crew() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    let r1 = EntityId::from("r1");
    let c1 = EntityId::from("c1");

    board
        .execute(Command::AssignCrew {
            request: r1.clone(),
            crew: c1.clone(),
        })
        .await
        .unwrap();
    board
        .execute(Command::UpdateRequestStatus {
            request: r1.clone(),
            status: RequestStatus::InProgress,
        })
        .await
        .unwrap();
    board
        .execute(Command::UpdateRequestStatus {
            request: r1.clone(),
            status: RequestStatus::Completed,
        })
        .await
        .unwrap();

    let store = board.store();
    let request = store.request_by_id(&r1).unwrap();
    assert_eq!(request.status, RequestStatus::Completed);
    assert!(request.completed_at.is_some());

    let crew = store.crew_by_id(&c1).unwrap();
    assert_eq!(crew.status, CrewStatus::Available);

    board.disconnect().await;
}

#[tokio::test]
async fn cancellation_keeps_the_crew_reference() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    let r1 = EntityId::from("r1");
    let c1 = EntityId::from("c1");

    board
        .execute(Command::AssignCrew {
            request: r1.clone(),
            crew: c1.clone(),
        })
        .await
        .unwrap();
    board
        .execute(Command::UpdateRequestStatus {
            request: r1.clone(),
            status: RequestStatus::Cancelled,
        })
        .await
        .unwrap();

    let store = board.store();
    let request = store.request_by_id(&r1).unwrap();
    assert_eq!(request.status, RequestStatus::Cancelled);
    // The record keeps who was sent, even though the crew is free again.
    assert_eq!(request.assigned_crew, Some(c1.clone()));

    let crew = store.crew_by_id(&c1).unwrap();
    assert_eq!(crew.status, CrewStatus::Available);

    board.disconnect().await;
}

#[tokio::test]
async fn illegal_lifecycle_jumps_are_rejected() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    // pending → completed skips the whole lifecycle
    let err = board
        .execute(Command::UpdateRequestStatus {
            request: EntityId::from("r1"),
            status: RequestStatus::Completed,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    board.disconnect().await;
}

#[tokio::test]
async fn crew_registration_and_patch() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    let result = board
        .execute(Command::CreateCrew(CreateCrewInput {
            name: "Night Watch".into(),
            callsign: Some("Nightwatch".into()),
            ship: Some("Vanguard Sentinel".into()),
            capabilities: vec![ServiceType::Escort],
            location: Some("Stanton".into()),
            members: vec![EntityId::from("u1")],
        }))
        .await
        .unwrap();
    let CommandResult::Crew(crew) = result else {
        panic!("expected a crew back");
    };
    assert_eq!(crew.status, CrewStatus::Available);
    assert_eq!(crew.callsign.as_deref(), Some("Nightwatch"));
    assert_eq!(crew.members, vec![EntityId::from("u1")]);
    assert_eq!(board.store().crew_count(), 3);

    board
        .execute(Command::UpdateCrew {
            crew: crew.id.clone(),
            patch: CrewPatch {
                status: Some(CrewStatus::Standby),
                location: Some("Hurston orbit".into()),
                ..CrewPatch::default()
            },
        })
        .await
        .unwrap();

    let updated = board.store().crew_by_id(&crew.id).unwrap();
    assert_eq!(updated.status, CrewStatus::Standby);
    assert_eq!(updated.location.as_deref(), Some("Hurston orbit"));

    let err = board
        .execute(Command::UpdateCrew {
            crew: crew.id.clone(),
            patch: CrewPatch::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    board.disconnect().await;
}

#[tokio::test]
async fn unknown_ids_report_not_found() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.sign_in().unwrap();

    let err = board
        .execute(Command::AssignCrew {
            request: EntityId::from("missing"),
            crew: EntityId::from("c1"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::RequestNotFound { .. }));

    let err = board
        .execute(Command::AssignCrew {
            request: EntityId::from("r1"),
            crew: EntityId::from("missing"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CrewNotFound { .. }));

    board.disconnect().await;
}

#[tokio::test]
async fn commands_fail_after_disconnect() {
    let board = connected_board(Some(dispatcher_operator())).await;
    board.disconnect().await;

    let err = board
        .execute(Command::CreateRequest(CreateRequestInput {
            service: ServiceType::Sar,
            priority: Priority::High,
            location: "Daymar".into(),
            description: "stranded pilot".into(),
            requester: None,
            discord_username: None,
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::BoardDisconnected));
}

#[tokio::test]
async fn oneshot_connects_runs_and_disconnects() {
    let adapter = StoreAdapter::memory(MemoryStore::with_demo_fixtures());

    let pending = DispatchBoard::oneshot(
        config(Some(dispatcher_operator())),
        Some(adapter),
        |board| async move { Ok(board.store().pending_request_count()) },
    )
    .await
    .unwrap();

    assert_eq!(pending, 2);
}
