//! In-process row store with the same contract as the REST backend.
//!
//! Backs `lifeline --demo` and the integration tests: full CRUD plus a
//! change feed, no network. Rows are stored as raw JSON so the same row
//! types and queries work against both adapters.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Error;
use crate::feed::{ChangeAction, ChangeEvent};
use crate::rest::Select;
use crate::rows::Table;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A backend that lives entirely in process memory.
///
/// Cheap to clone; all clones share the same tables and feed.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<DashMap<Table, Vec<serde_json::Value>>>,
    event_tx: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = DashMap::new();
        for table in [Table::Requests, Table::Crews, Table::Personnel, Table::Activity] {
            tables.insert(table, Vec::new());
        }
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tables: Arc::new(tables),
            event_tx,
        }
    }

    /// A store pre-seeded with a small roster: two crews, one dispatcher,
    /// and two open requests. Used by demo mode and the CLI tests.
    pub fn with_demo_fixtures() -> Self {
        let store = Self::new();

        store.seed(
            Table::Crews,
            serde_json::json!({
                "id": "c1",
                "name": "Phoenix Squadron",
                "callsign": "Phoenix",
                "ship": "Cutlass Red",
                "status": "available",
                "capabilities": ["SAR", "Medical"],
                "location": "Stanton",
                "members": ["u1"],
                "created_at": "2026-01-05T08:00:00Z"
            }),
        );
        store.seed(
            Table::Crews,
            serde_json::json!({
                "id": "c2",
                "name": "Starrunner Team",
                "callsign": "Starrunner",
                "ship": "Starfarer",
                "status": "available",
                "capabilities": ["Refueling", "Cargo"],
                "location": "Crusader",
                "members": [],
                "created_at": "2026-01-06T09:30:00Z"
            }),
        );
        store.seed(
            Table::Personnel,
            serde_json::json!({
                "id": "u1",
                "discord_id": "100000000000000001",
                "username": "Commander Reyes",
                "avatar_url": null,
                "role": "dispatcher",
                "online": true,
                "last_seen": "2026-02-10T11:59:00Z",
                "crew_id": "c1",
                "created_at": "2026-01-01T00:00:00Z"
            }),
        );
        store.seed(
            Table::Requests,
            serde_json::json!({
                "id": "r1",
                "type": "SAR",
                "priority": "high",
                "location": "Daymar",
                "description": "Downed ship, two souls aboard",
                "status": "pending",
                "requester_id": null,
                "requester_name": "Eli Vance",
                "discord_username": "eli_vance",
                "assigned_crew_id": null,
                "dispatcher_id": null,
                "created_at": "2026-02-10T11:45:00Z",
                "completed_at": null
            }),
        );
        store.seed(
            Table::Requests,
            serde_json::json!({
                "id": "r2",
                "type": "Refueling",
                "priority": "medium",
                "location": "Yela orbit",
                "description": null,
                "status": "pending",
                "requester_id": null,
                "requester_name": "Mara Sol",
                "discord_username": null,
                "assigned_crew_id": null,
                "dispatcher_id": null,
                "created_at": "2026-02-10T11:50:00Z",
                "completed_at": null
            }),
        );

        store
    }

    /// Insert a row verbatim, without filling defaults or emitting a
    /// change event. Fixture setup only.
    pub fn seed(&self, table: Table, row: serde_json::Value) {
        if let Some(mut rows) = self.tables.get_mut(&table) {
            rows.push(row);
        }
    }

    pub fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        query: &Select,
    ) -> Result<Vec<T>, Error> {
        let mut rows: Vec<serde_json::Value> = self
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        query.sort_and_truncate(&mut rows);

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row.clone()).map_err(|e| Error::Deserialization {
                    message: format!("{table}: {e}"),
                    body: row.to_string(),
                })
            })
            .collect()
    }

    /// Insert a row, filling `id` and `created_at` the way the real
    /// backend would, and return it as stored.
    pub fn insert<T: DeserializeOwned>(
        &self,
        table: Table,
        row: &impl Serialize,
    ) -> Result<T, Error> {
        let mut value = serde_json::to_value(row).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })?;

        if let Some(object) = value.as_object_mut() {
            object
                .entry("id")
                .or_insert_with(|| serde_json::Value::String(Uuid::new_v4().to_string()));
            object
                .entry("created_at")
                .or_insert_with(|| serde_json::Value::String(Utc::now().to_rfc3339()));
        }

        let record_id = value["id"].as_str().map(String::from);
        self.seed(table, value.clone());

        let _ = self.event_tx.send(ChangeEvent {
            table,
            action: ChangeAction::Insert,
            record_id,
        });

        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: format!("{table}: {e}"),
            body: value.to_string(),
        })
    }

    /// Merge patch keys into the row with the given id.
    pub fn update(
        &self,
        table: Table,
        id: &str,
        patch: &impl Serialize,
    ) -> Result<(), Error> {
        let patch = serde_json::to_value(patch).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })?;

        let mut rows = self.tables.get_mut(&table).ok_or(Error::RowNotFound {
            table: table.name(),
            id: id.to_owned(),
        })?;

        let row = rows
            .iter_mut()
            .find(|row| row["id"].as_str() == Some(id))
            .ok_or(Error::RowNotFound {
                table: table.name(),
                id: id.to_owned(),
            })?;

        if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        drop(rows);

        let _ = self.event_tx.send(ChangeEvent {
            table,
            action: ChangeAction::Update,
            record_id: Some(id.to_owned()),
        });

        Ok(())
    }

    /// Subscribe to change events emitted by this store's mutations.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::rows::{CrewRow, RequestInsert, RequestRow};

    #[test]
    fn demo_fixtures_have_two_pending_requests() {
        let store = MemoryStore::with_demo_fixtures();
        let rows: Vec<RequestRow> = store
            .select(Table::Requests, &Select::new().eq("status", "pending"))
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn insert_fills_id_and_timestamp_and_emits_event() {
        let store = MemoryStore::new();
        let mut feed = store.subscribe();

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
            .unwrap();

        assert!(!row.id.is_empty());

        let event = feed.try_recv().unwrap();
        assert_eq!(event.table, Table::Requests);
        assert_eq!(event.action, ChangeAction::Insert);
        assert_eq!(event.record_id.as_deref(), Some(row.id.as_str()));
    }

    #[test]
    fn update_merges_patch_keys() {
        let store = MemoryStore::with_demo_fixtures();

        store
            .update(
                Table::Crews,
                "c1",
                &serde_json::json!({ "status": "on-mission" }),
            )
            .unwrap();

        let rows: Vec<CrewRow> = store
            .select(Table::Crews, &Select::new().eq("id", "c1"))
            .unwrap();
        assert_eq!(rows[0].status, "on-mission");
        // Untouched columns survive the patch
        assert_eq!(rows[0].name, "Phoenix Squadron");
    }

    #[test]
    fn update_unknown_id_is_row_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Table::Crews, "ghost", &serde_json::json!({ "status": "available" }))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn select_orders_newest_first() {
        let store = MemoryStore::with_demo_fixtures();
        let rows: Vec<RequestRow> = store
            .select(Table::Requests, &Select::new().order_desc("created_at"))
            .unwrap();
        assert_eq!(rows[0].id, "r2");
        assert_eq!(rows[1].id, "r1");
    }
}
