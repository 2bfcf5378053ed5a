// ── Core error types ──
//
// User-facing errors from lifeline-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<lifeline_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Board is not connected")]
    BoardDisconnected,

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Service request not found: {identifier}")]
    RequestNotFound { identifier: String },

    #[error("Crew not found: {identifier}")]
    CrewNotFound { identifier: String },

    #[error("Personnel not found: {identifier}")]
    PersonnelNotFound { identifier: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Not permitted: {action} requires the dispatcher role")]
    Forbidden { action: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation rejected by backend: {message}")]
    Rejected { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lifeline_api::Error> for CoreError {
    fn from(err: lifeline_api::Error) -> Self {
        match err {
            lifeline_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            lifeline_api::Error::StateMismatch => CoreError::AuthenticationFailed {
                message: "OAuth callback did not match the sign-in attempt".into(),
            },
            lifeline_api::Error::ConsentDenied { reason } => CoreError::AuthenticationFailed {
                message: format!("authorization denied: {reason}"),
            },
            lifeline_api::Error::ExchangeFailed { status } => CoreError::AuthenticationFailed {
                message: format!("token exchange rejected (HTTP {status})"),
            },
            lifeline_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            lifeline_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lifeline_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            lifeline_api::Error::Backend { message, status } => match status {
                404 => CoreError::NotFound {
                    entity_type: "resource".into(),
                    identifier: message,
                },
                _ => CoreError::Api {
                    message,
                    status: Some(status),
                },
            },
            lifeline_api::Error::RowNotFound { table, id } => CoreError::NotFound {
                entity_type: table.to_owned(),
                identifier: id,
            },
            lifeline_api::Error::FeedConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("change feed connection failed: {reason}"),
            },
            lifeline_api::Error::FeedClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("change feed closed (code {code}): {reason}"),
            },
            lifeline_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
