// ── Runtime board configuration ──
//
// These types describe *how* to reach the backend. They carry credential
// data and connection tuning, but never touch disk. The CLI constructs a
// `BoardConfig` from its profile files and hands it in.

use secrecy::SecretString;
use url::Url;

use lifeline_api::OAuthConfig;

/// A locally configured operator identity, used to restore a session
/// without walking the full OAuth flow (the CLI's normal path).
#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub discord_id: String,
    pub avatar_url: Option<String>,
}

/// OAuth provider settings plus the client secret for code exchange.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub provider: OAuthConfig,
    pub client_secret: SecretString,
}

/// Configuration for connecting to one dispatch backend.
///
/// Built by the CLI, passed to `DispatchBoard` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Backend base URL (e.g. `https://abc.supabase.example`).
    pub backend_url: Url,
    /// Anon API key for the row store.
    pub api_key: SecretString,
    /// Enable the realtime change feed.
    pub feed_enabled: bool,
    /// How often to perform a full refresh (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Request timeout.
    pub timeout: std::time::Duration,
    /// OAuth sign-in settings, when interactive sign-in is configured.
    pub oauth: Option<OAuthSettings>,
    /// Pre-configured operator identity for session restore.
    pub operator: Option<Operator>,
}

impl BoardConfig {
    /// The realtime WebSocket endpoint derived from the backend URL.
    pub fn feed_url(&self) -> Result<Url, url::ParseError> {
        let mut url = self.backend_url.join("realtime/v1/changes")?;
        let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
        // set_scheme only rejects invalid transitions; ws(s) from http(s) is fine.
        let _ = url.set_scheme(scheme);
        Ok(url)
    }
}
