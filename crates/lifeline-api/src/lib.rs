//! Async client for the Lifeline dispatch backend.
//!
//! Three surfaces:
//!
//! - **Row store** ([`rest`], [`memory`], unified by [`store::StoreAdapter`]):
//!   CRUD over the four backend tables.
//! - **Change feed** ([`feed`]): WebSocket stream of row-change
//!   notifications with automatic reconnection.
//! - **OAuth** ([`auth`]): authorization-code sign-in against a
//!   Discord-shaped identity provider.
//!
//! This crate deals in wire types only ([`rows`]); the domain model
//! lives in `lifeline-core`.

pub mod auth;
pub mod error;
pub mod feed;
pub mod memory;
pub mod rest;
pub mod rows;
pub mod store;
pub mod transport;

pub use auth::{AuthAttempt, OAuthClient, OAuthConfig, OAuthIdentity};
pub use error::Error;
pub use feed::{ChangeAction, ChangeEvent, FeedHandle, ReconnectConfig};
pub use memory::MemoryStore;
pub use rest::{RestStore, Select};
pub use rows::Table;
pub use store::StoreAdapter;
pub use transport::TransportConfig;
