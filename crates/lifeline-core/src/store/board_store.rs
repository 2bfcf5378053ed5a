// ── Central reactive board store ──
//
// Thread-safe storage for all dispatch entities. Every refresh swaps
// in a complete snapshot; subscribers are notified via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{ActivityEntry, Crew, EntityId, Personnel, RequestStatus, ServiceRequest};
use crate::stream::EntityStream;

/// Central reactive store for the dispatch board.
///
/// Thread-safe and lock-free: all reads are wait-free, writes use
/// fine-grained per-shard locks within `DashMap`. Replacements are
/// broadcast to subscribers via `watch` channels.
pub struct BoardStore {
    pub(crate) requests: EntityCollection<ServiceRequest>,
    pub(crate) crews: EntityCollection<Crew>,
    pub(crate) personnel: EntityCollection<Personnel>,
    pub(crate) activity: EntityCollection<ActivityEntry>,
    pub(crate) last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) last_feed_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl BoardStore {
    pub fn new() -> Self {
        let (last_full_refresh, _) = watch::channel(None);
        let (last_feed_event, _) = watch::channel(None);

        Self {
            requests: EntityCollection::new(),
            crews: EntityCollection::new(),
            personnel: EntityCollection::new(),
            activity: EntityCollection::new(),
            last_full_refresh,
            last_feed_event,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn requests_snapshot(&self) -> Arc<Vec<Arc<ServiceRequest>>> {
        self.requests.snapshot()
    }

    pub fn crews_snapshot(&self) -> Arc<Vec<Arc<Crew>>> {
        self.crews.snapshot()
    }

    pub fn personnel_snapshot(&self) -> Arc<Vec<Arc<Personnel>>> {
        self.personnel.snapshot()
    }

    pub fn activity_snapshot(&self) -> Arc<Vec<Arc<ActivityEntry>>> {
        self.activity.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn request_by_id(&self, id: &EntityId) -> Option<Arc<ServiceRequest>> {
        self.requests.get(id)
    }

    pub fn crew_by_id(&self, id: &EntityId) -> Option<Arc<Crew>> {
        self.crews.get(id)
    }

    pub fn personnel_by_id(&self, id: &EntityId) -> Option<Arc<Personnel>> {
        self.personnel.get(id)
    }

    /// Look up a person by their Discord account id.
    pub fn personnel_by_discord_id(&self, discord_id: &str) -> Option<Arc<Personnel>> {
        self.personnel
            .snapshot()
            .iter()
            .find(|p| p.discord_id == discord_id)
            .cloned()
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn crew_count(&self) -> usize {
        self.crews.len()
    }

    pub fn personnel_count(&self) -> usize {
        self.personnel.len()
    }

    /// Requests still waiting for a crew.
    pub fn pending_request_count(&self) -> usize {
        self.requests
            .snapshot()
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_requests(&self) -> EntityStream<ServiceRequest> {
        EntityStream::new(self.requests.subscribe())
    }

    pub fn subscribe_crews(&self) -> EntityStream<Crew> {
        EntityStream::new(self.crews.subscribe())
    }

    pub fn subscribe_personnel(&self) -> EntityStream<Personnel> {
        EntityStream::new(self.personnel.subscribe())
    }

    pub fn subscribe_activity(&self) -> EntityStream<ActivityEntry> {
        EntityStream::new(self.activity.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    pub fn last_feed_event(&self) -> Option<DateTime<Utc>> {
        *self.last_feed_event.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}
