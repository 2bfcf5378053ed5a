//! Shared configuration for the Lifeline CLI.
//!
//! TOML profiles, credential resolution (env + plaintext), and
//! translation to `lifeline_core::BoardConfig`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use lifeline_core::{BoardConfig, OAuthConfig, OAuthSettings, Operator};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://abcdef.supabase.example").
    pub backend: String,

    /// Anon API key (plaintext -- prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Enable the realtime change feed.
    #[serde(default = "default_feed")]
    pub feed: bool,

    /// Full-refresh interval in seconds. 0 disables polling.
    #[serde(default = "default_refresh")]
    pub refresh_interval_secs: u64,

    /// Override the request timeout.
    pub timeout: Option<u64>,

    /// Locally configured operator identity for session restore.
    pub operator: Option<OperatorEntry>,

    /// OAuth sign-in settings.
    pub oauth: Option<OAuthEntry>,
}

fn default_feed() -> bool {
    true
}
fn default_refresh() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperatorEntry {
    pub name: String,
    pub discord_id: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OAuthEntry {
    pub client_id: String,
    pub redirect_uri: String,

    /// Client secret (plaintext -- prefer `client_secret_env`).
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    pub client_secret_env: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "lifeline", "lifeline").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lifeline");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path. The environment still overrides the file.
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LIFELINE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an API key: named env var first, then plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn resolve_client_secret(oauth: &OAuthEntry, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = oauth.client_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref secret) = oauth.client_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Values that still look like template placeholders from a generated
/// config file ("your-project", "YOUR_KEY_HERE", ...).
fn is_placeholder(value: &str) -> bool {
    let v = value.trim_start_matches("https://").trim_start_matches("http://");
    v.starts_with("your") || v.starts_with("YOUR")
}

// ── Translation to BoardConfig ──────────────────────────────────────

/// Build a `BoardConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_board_config(
    profile: &Profile,
    profile_name: &str,
    default_timeout_secs: u64,
) -> Result<BoardConfig, ConfigError> {
    if is_placeholder(&profile.backend) {
        return Err(ConfigError::Validation {
            field: "backend".into(),
            reason: format!(
                "'{}' looks like an unfilled template value",
                profile.backend
            ),
        });
    }

    let backend_url: Url = profile
        .backend
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "backend".into(),
            reason: format!("invalid URL: {}", profile.backend),
        })?;

    let api_key = resolve_api_key(profile, profile_name)?;

    let oauth = match profile.oauth {
        Some(ref entry) => {
            let redirect_uri: Url =
                entry
                    .redirect_uri
                    .parse()
                    .map_err(|_| ConfigError::Validation {
                        field: "oauth.redirect_uri".into(),
                        reason: format!("invalid URL: {}", entry.redirect_uri),
                    })?;
            let provider = OAuthConfig::discord(entry.client_id.clone(), redirect_uri)
                .map_err(|e| ConfigError::Validation {
                    field: "oauth".into(),
                    reason: e.to_string(),
                })?;
            Some(OAuthSettings {
                provider,
                client_secret: resolve_client_secret(entry, profile_name)?,
            })
        }
        None => None,
    };

    let operator = profile.operator.as_ref().map(|op| Operator {
        name: op.name.clone(),
        discord_id: op.discord_id.clone(),
        avatar_url: op.avatar_url.clone(),
    });

    Ok(BoardConfig {
        backend_url,
        api_key,
        feed_enabled: profile.feed,
        refresh_interval_secs: profile.refresh_interval_secs,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout_secs)),
        oauth,
        operator,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(backend: &str) -> Profile {
        Profile {
            backend: backend.into(),
            api_key: Some("anon-key".into()),
            api_key_env: None,
            feed: true,
            refresh_interval_secs: 300,
            timeout: None,
            operator: None,
            oauth: None,
        }
    }

    #[test]
    fn default_config_points_at_default_profile() {
        let config = Config::default();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn missing_profile_is_reported() {
        let config = Config::default();
        let err = config.profile(Some("prod")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
    }

    #[test]
    fn placeholder_backend_is_rejected() {
        for backend in [
            "https://your-project.supabase.example",
            "YOUR_BACKEND_URL",
            "your-backend.example",
        ] {
            let err = profile_to_board_config(&profile(backend), "default", 30).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }), "{backend}");
        }
    }

    #[test]
    fn plaintext_api_key_resolves() {
        let config =
            profile_to_board_config(&profile("https://abc.backend.example"), "default", 30)
                .unwrap();
        assert_eq!(config.backend_url.host_str(), Some("abc.backend.example"));
        assert_eq!(config.refresh_interval_secs, 300);
        assert!(config.feed_enabled);
    }

    #[test]
    fn missing_api_key_is_no_credentials() {
        let mut p = profile("https://abc.backend.example");
        p.api_key = None;
        let err = profile_to_board_config(&p, "default", 30).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn env_var_wins_over_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LIFELINE_TEST_API_KEY", "from-env");

            let mut p = profile("https://abc.backend.example");
            p.api_key_env = Some("LIFELINE_TEST_API_KEY".into());

            let key = resolve_api_key(&p, "default").unwrap();
            use secrecy::ExposeSecret;
            assert_eq!(key.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn toml_file_round_trips_through_figment() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    default_profile = "home"

                    [profiles.home]
                    backend = "https://abc.backend.example"
                    api_key = "anon-key"
                    refresh_interval_secs = 60

                    [profiles.home.operator]
                    name = "Commander Reyes"
                    discord_id = "100000000000000001"
                "#,
            )?;

            let config = load_config_from(std::path::Path::new("config.toml")).unwrap();
            let (name, p) = config.profile(None).unwrap();
            assert_eq!(name, "home");
            assert_eq!(p.refresh_interval_secs, 60);
            assert!(p.feed);
            assert_eq!(
                p.operator.as_ref().unwrap().discord_id,
                "100000000000000001"
            );

            let board = profile_to_board_config(p, name, 30).unwrap();
            assert_eq!(board.operator.unwrap().name, "Commander Reyes");
            Ok(())
        });
    }
}
