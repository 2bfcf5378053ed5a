//! Row CRUD over the backend's PostgREST-style HTTP surface.
//!
//! Every table is exposed under `/rest/v1/{table}` with query-string
//! filters (`id=eq.{id}`, `order=created_at.desc`). Mutations use
//! `Prefer: return=representation` so the written row comes back in the
//! response and can be applied to the store without a second fetch.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;
use crate::rows::Table;
use crate::transport::TransportConfig;

// ── Query builder ────────────────────────────────────────────────────

/// Filters and ordering for a row select.
#[derive(Debug, Clone, Default)]
pub struct Select {
    filters: Vec<(String, String)>,
    order_desc: Option<&'static str>,
    limit: Option<u32>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter: `column=eq.value`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    /// Order by a column, newest first.
    pub fn order_desc(mut self, column: &'static str) -> Self {
        self.order_desc = Some(column);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a raw row satisfies every equality filter.
    ///
    /// Shared with the in-memory backend so both adapters answer the
    /// same query identically.
    pub(crate) fn matches(&self, row: &serde_json::Value) -> bool {
        self.filters.iter().all(|(column, filter)| {
            let value = filter.strip_prefix("eq.").unwrap_or(filter);
            row.get(column).and_then(|v| v.as_str()) == Some(value)
        })
    }

    /// Apply ordering and limit to an already-filtered row set.
    pub(crate) fn sort_and_truncate(&self, rows: &mut Vec<serde_json::Value>) {
        if let Some(column) = self.order_desc {
            // ISO-8601 timestamps sort correctly as strings.
            rows.sort_by(|a, b| {
                let a = a.get(column).and_then(|v| v.as_str()).unwrap_or("");
                let b = b.get(column).and_then(|v| v.as_str()).unwrap_or("");
                b.cmp(a)
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit as usize);
        }
    }

    fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        for (column, filter) in &self.filters {
            pairs.append_pair(column, filter);
        }
        if let Some(column) = self.order_desc {
            pairs.append_pair("order", &format!("{column}.desc"));
        }
        if let Some(limit) = self.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }
}

// ── RestStore ────────────────────────────────────────────────────────

/// HTTP client for the backend row store.
///
/// Cheap to clone; the inner `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct RestStore {
    base: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl RestStore {
    /// Build a store client for the given backend base URL.
    ///
    /// The transport's API key is attached to every request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            base: base_url,
            client: transport.build_client()?,
            timeout: transport.timeout,
        })
    }

    /// Deadline exceeded becomes [`Error::Timeout`]; everything else
    /// stays a transport error.
    fn send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(e)
        }
    }

    fn table_url(&self, table: Table) -> Result<Url, Error> {
        self.base
            .join(&format!("rest/v1/{}", table.name()))
            .map_err(Error::InvalidUrl)
    }

    /// Fetch rows from a table.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        query: &Select,
    ) -> Result<Vec<T>, Error> {
        let mut url = self.table_url(table)?;
        query.apply(&mut url);

        tracing::debug!(%table, url = %url, "selecting rows");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        parse_rows(table, response).await
    }

    /// Insert a row and return it as written by the backend
    /// (id and timestamps filled in).
    pub async fn insert<T: DeserializeOwned>(
        &self,
        table: Table,
        row: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.table_url(table)?;

        tracing::debug!(%table, "inserting row");
        let response = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let mut rows: Vec<T> = parse_rows(table, response).await?;
        rows.pop().ok_or(Error::Deserialization {
            message: "insert returned no representation".into(),
            body: String::new(),
        })
    }

    /// Patch columns on a single row, selected by id.
    pub async fn update(
        &self,
        table: Table,
        id: &str,
        patch: &impl Serialize,
    ) -> Result<(), Error> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));

        tracing::debug!(%table, id, "updating row");
        let response = self
            .client
            .patch(url)
            .json(patch)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(error_from_status(status, response.text().await.unwrap_or_default()))
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn parse_rows<T: DeserializeOwned>(
    table: Table,
    response: reqwest::Response,
) -> Result<Vec<T>, Error> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(%table, status = status.as_u16(), "backend rejected request");
        return Err(error_from_status(status, body));
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{table}: {e}"),
        body,
    })
}

fn error_from_status(status: StatusCode, body: String) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::Authentication {
            message: "backend rejected the API key".into(),
        };
    }

    // PostgREST errors arrive as {"message": "...", ...}; fall back to
    // the raw body when the shape differs.
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body);

    Error::Backend {
        message,
        status: status.as_u16(),
    }
}
