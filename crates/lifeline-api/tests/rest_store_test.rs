//! Integration tests for the REST row store against a mock backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use lifeline_api::rows::{CrewRow, RequestInsert, RequestRow};
use lifeline_api::{RestStore, Select, Table, TransportConfig};
use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> RestStore {
    let transport = TransportConfig {
        timeout: Duration::from_secs(5),
        api_key: Some(SecretString::from("anon-key")),
    };
    let base = Url::parse(&server.uri()).unwrap();
    RestStore::new(base, &transport).unwrap()
}

#[tokio::test]
async fn select_sends_filters_and_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/service_requests"))
        .and(query_param("status", "eq.pending"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "r1",
                "type": "SAR",
                "priority": "high",
                "location": "Daymar",
                "description": null,
                "status": "pending",
                "requester_id": null,
                "requester_name": "Eli Vance",
                "assigned_crew_id": null,
                "dispatcher_id": null,
                "created_at": "2026-02-10T11:45:00Z",
                "completed_at": null
            }
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let rows: Vec<RequestRow> = store
        .select(
            Table::Requests,
            &Select::new().eq("status", "pending").order_desc("created_at"),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].service, "SAR");
    assert_eq!(rows[0].requester_name, "Eli Vance");
}

#[tokio::test]
async fn insert_requests_representation_and_returns_written_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/service_requests"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            {
                "id": "generated-id",
                "type": "Medical",
                "priority": "critical",
                "location": "Lorville",
                "description": null,
                "status": "pending",
                "requester_id": null,
                "requester_name": "Ada",
                "assigned_crew_id": null,
                "dispatcher_id": null,
                "created_at": "2026-02-10T12:00:00Z",
                "completed_at": null
            }
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let row: RequestRow = store
        .insert(
            Table::Requests,
            &RequestInsert {
                service: "Medical".into(),
                priority: "critical".into(),
                location: "Lorville".into(),
                description: None,
                status: "pending".into(),
                requester_id: None,
                requester_name: "Ada".into(),
                discord_username: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(row.id, "generated-id");
    assert_eq!(row.status, "pending");
}

#[tokio::test]
async fn update_patches_row_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/crews"))
        .and(query_param("id", "eq.c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store
        .update(Table::Crews, "c1", &serde_json::json!({ "status": "on-mission" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn unauthorized_select_maps_to_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/crews"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .select::<CrewRow>(Table::Crews, &Select::new())
        .await
        .unwrap_err();

    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn backend_error_carries_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/service_requests"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "message": "row is locked"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .update(
            Table::Requests,
            "r1",
            &serde_json::json!({ "status": "assigned" }),
        )
        .await
        .unwrap_err();

    match err {
        lifeline_api::Error::Backend { message, status } => {
            assert_eq!(status, 409);
            assert_eq!(message, "row is locked");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_backend_maps_to_timeout_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/crews"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig {
        timeout: Duration::from_millis(100),
        api_key: None,
    };
    let store = RestStore::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    let err = store
        .select::<CrewRow>(Table::Crews, &Select::new())
        .await
        .unwrap_err();

    assert!(matches!(err, lifeline_api::Error::Timeout { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_body_is_a_deserialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/crews"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .select::<CrewRow>(Table::Crews, &Select::new())
        .await
        .unwrap_err();

    assert!(matches!(err, lifeline_api::Error::Deserialization { .. }));
}
