use thiserror::Error;

/// Top-level error type for the `lifeline-api` crate.
///
/// Covers every failure mode across all backend surfaces:
/// OAuth, transport, row CRUD, and the change feed.
/// `lifeline-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in failed (provider rejected the session, token revoked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// OAuth callback carried a `state` that does not match the attempt
    /// we started. The callback is discarded.
    #[error("OAuth state mismatch -- callback does not belong to this sign-in attempt")]
    StateMismatch,

    /// The user declined the consent screen at the provider.
    #[error("Authorization denied by provider: {reason}")]
    ConsentDenied { reason: String },

    /// The authorization-code exchange was rejected.
    #[error("Token exchange failed (HTTP {status})")]
    ExchangeFailed { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Backend rows ────────────────────────────────────────────────
    /// Structured error from the row store (non-2xx with a body).
    #[error("Backend error (HTTP {status}): {message}")]
    Backend { message: String, status: u16 },

    /// A row lookup by id matched nothing.
    #[error("No row in '{table}' with id {id}")]
    RowNotFound { table: &'static str, id: String },

    // ── Change feed ─────────────────────────────────────────────────
    /// Change-feed WebSocket connection failed.
    #[error("Change feed connection failed: {0}")]
    FeedConnect(String),

    /// Change feed closed unexpectedly.
    #[error("Change feed closed (code {code}): {reason}")]
    FeedClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates credentials are no longer
    /// valid and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Backend { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::FeedConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::RowNotFound { .. } | Self::Backend { status: 404, .. } => true,
            _ => false,
        }
    }
}
