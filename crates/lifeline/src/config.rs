//! CLI configuration -- thin wrapper around `lifeline_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--backend, --api-key, --timeout).

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lifeline_api::{MemoryStore, StoreAdapter};
use lifeline_core::{BoardConfig, Operator};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use lifeline_config::{
    Config, Defaults, OperatorEntry, Profile, config_path, load_config_or_default,
    profile_to_board_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate config + global flags into a `BoardConfig` and an optional
/// pre-built adapter.
///
/// Resolution order:
/// 1. `--demo` wins: in-memory fixture board, no config file needed.
/// 2. `--backend` + `--api-key` flags alone work without a config file.
/// 3. Otherwise the active profile from the config file, with flag
///    overrides applied on top.
pub fn resolve_board(global: &GlobalOpts) -> Result<(BoardConfig, Option<StoreAdapter>), CliError> {
    if global.demo {
        return Ok(demo_board());
    }

    let config = load_config_or_default();
    let profile_name = active_profile_name(global, &config);

    // If the profile exists, use it with CLI flag overrides on top.
    if let Some(profile) = config.profiles.get(&profile_name) {
        let mut profile = profile.clone();
        if let Some(ref backend) = global.backend {
            profile.backend.clone_from(backend);
        }
        if let Some(ref key) = global.api_key {
            profile.api_key = Some(key.clone());
            profile.api_key_env = None;
        }
        let board = profile_to_board_config(&profile, &profile_name, global.timeout)?;
        return Ok((board, None));
    }

    // An explicitly requested profile that doesn't exist is an error,
    // not a fall-through.
    if global.profile.is_some() {
        let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // No profile -- try to build from CLI flags / env vars alone.
    let Some(ref backend) = global.backend else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };
    Ok((flags_only_board(backend, global)?, None))
}

/// Board config from `--backend`/`--api-key` flags alone.
fn flags_only_board(backend: &str, global: &GlobalOpts) -> Result<BoardConfig, CliError> {
    let backend_url: Url = backend.parse().map_err(|_| CliError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL: {backend}"),
    })?;

    let Some(ref key) = global.api_key else {
        return Err(CliError::NoCredentials {
            profile: "(flags)".into(),
        });
    };

    Ok(BoardConfig {
        backend_url,
        api_key: SecretString::from(key.clone()),
        feed_enabled: true,
        refresh_interval_secs: 0,
        timeout: Duration::from_secs(global.timeout),
        oauth: None,
        operator: None,
    })
}

/// The built-in demo board: fixture data, fixture dispatcher identity.
fn demo_board() -> (BoardConfig, Option<StoreAdapter>) {
    let config = BoardConfig {
        // Never dialed; the memory adapter intercepts everything.
        backend_url: Url::parse("http://demo.invalid/").expect("static URL"),
        api_key: SecretString::from("demo"),
        feed_enabled: true,
        refresh_interval_secs: 0,
        timeout: Duration::from_secs(5),
        oauth: None,
        // Matches the fixture roster so dispatcher commands work out of the box.
        operator: Some(Operator {
            name: "Commander Reyes".into(),
            discord_id: "100000000000000001".into(),
            avatar_url: None,
        }),
    };
    let adapter = StoreAdapter::memory(MemoryStore::with_demo_fixtures());
    (config, Some(adapter))
}
