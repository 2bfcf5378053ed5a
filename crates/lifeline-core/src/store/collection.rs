// ── Generic reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based
// change notification via `watch` channels.
//
// The board's data flow is refetch-and-replace: every refresh swaps in
// a complete new row set, so the only mutation is `replace_all`. The
// snapshot preserves backend fetch order (newest-first for requests
// and activity).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{ActivityEntry, Crew, EntityId, Personnel, ServiceRequest};

/// Anything stored in an [`EntityCollection`] exposes its primary key.
pub trait Keyed {
    fn key(&self) -> &EntityId;
}

impl Keyed for ServiceRequest {
    fn key(&self) -> &EntityId {
        &self.id
    }
}

impl Keyed for Crew {
    fn key(&self) -> &EntityId {
        &self.id
    }
}

impl Keyed for Personnel {
    fn key(&self) -> &EntityId {
        &self.id
    }
}

impl Keyed for ActivityEntry {
    fn key(&self) -> &EntityId {
        &self.id
    }
}

/// A lock-free, reactive collection for a single entity type.
///
/// Uses `DashMap` for O(1) concurrent lookups and `watch` channels for
/// push-based change notification. Every replacement bumps a version
/// counter and publishes the new snapshot to subscribers.
pub(crate) struct EntityCollection<T: Keyed + Clone + Send + Sync + 'static> {
    /// Primary index: id -> entity.
    by_id: DashMap<EntityId, Arc<T>>,

    /// Version counter, bumped on every replacement.
    version: watch::Sender<u64>,

    /// Full snapshot in fetch order, swapped on replacement.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Keyed + Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the whole collection with a freshly fetched row set.
    pub(crate) fn replace_all(&self, items: Vec<T>) {
        let ordered: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();

        self.by_id.clear();
        for item in &ordered {
            self.by_id.insert(item.key().clone(), Arc::clone(item));
        }

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(ordered));
        self.version.send_modify(|v| *v += 1);
    }

    /// Look up an entity by id.
    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
