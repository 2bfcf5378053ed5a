//! Unified surface over the REST backend and the in-memory fixture.
//!
//! Everything above this module talks to a [`StoreAdapter`] and never
//! learns which backend is behind it. Demo mode and the test suites run
//! the exact same code paths as production, minus the network.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::feed::{ChangeEvent, FeedHandle, ReconnectConfig};
use crate::memory::MemoryStore;
use crate::rest::{RestStore, Select};
use crate::rows::Table;
use crate::transport::TransportConfig;

/// A row store plus its change feed, REST-backed or in-process.
#[derive(Debug, Clone)]
pub enum StoreAdapter {
    Rest {
        store: RestStore,
        /// Realtime endpoint; `None` disables the feed (polling only).
        feed_url: Option<Url>,
    },
    Memory(MemoryStore),
}

impl StoreAdapter {
    /// Build a REST-backed adapter.
    pub fn rest(
        base_url: Url,
        transport: &TransportConfig,
        feed_url: Option<Url>,
    ) -> Result<Self, Error> {
        Ok(Self::Rest {
            store: RestStore::new(base_url, transport)?,
            feed_url,
        })
    }

    /// Wrap an in-memory store.
    pub fn memory(store: MemoryStore) -> Self {
        Self::Memory(store)
    }

    /// Short backend label for log lines.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Rest { .. } => "rest",
            Self::Memory(_) => "memory",
        }
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        query: &Select,
    ) -> Result<Vec<T>, Error> {
        match self {
            Self::Rest { store, .. } => store.select(table, query).await,
            Self::Memory(store) => store.select(table, query),
        }
    }

    pub async fn insert<T: DeserializeOwned>(
        &self,
        table: Table,
        row: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        match self {
            Self::Rest { store, .. } => store.insert(table, row).await,
            Self::Memory(store) => store.insert(table, row),
        }
    }

    pub async fn update(
        &self,
        table: Table,
        id: &str,
        patch: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        match self {
            Self::Rest { store, .. } => store.update(table, id, patch).await,
            Self::Memory(store) => store.update(table, id, patch),
        }
    }

    /// Open the change feed, if this backend has one.
    ///
    /// For the REST backend this spawns the reconnection loop, governed
    /// by `cancel`. Returns `None` when no feed endpoint is configured.
    pub fn open_feed(
        &self,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Option<broadcast::Receiver<ChangeEvent>>, Error> {
        match self {
            Self::Rest { feed_url: None, .. } => Ok(None),
            Self::Rest {
                feed_url: Some(url),
                ..
            } => {
                let handle = FeedHandle::connect(url.clone(), reconnect, cancel)?;
                Ok(Some(handle.subscribe()))
            }
            Self::Memory(store) => Ok(Some(store.subscribe())),
        }
    }
}
