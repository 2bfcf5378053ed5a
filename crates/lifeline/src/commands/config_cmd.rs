//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Confirm, Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, OperatorEntry, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "backend = \"{}\"", p.backend);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        let _ = writeln!(out, "feed = {}", p.feed);
        let _ = writeln!(out, "refresh_interval_secs = {}", p.refresh_interval_secs);
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref operator) = p.operator {
            let _ = writeln!(out);
            let _ = writeln!(out, "[profiles.{name}.operator]");
            let _ = writeln!(out, "name = \"{}\"", operator.name);
            let _ = writeln!(out, "discord_id = \"{}\"", operator.discord_id);
        }
        if let Some(ref oauth) = p.oauth {
            let _ = writeln!(out);
            let _ = writeln!(out, "[profiles.{name}.oauth]");
            let _ = writeln!(out, "client_id = \"{}\"", oauth.client_id);
            let _ = writeln!(out, "redirect_uri = \"{}\"", oauth.redirect_uri);
            if oauth.client_secret.is_some() {
                let _ = writeln!(out, "client_secret = \"****\"");
            }
            if let Some(ref env) = oauth.client_secret_env {
                let _ = writeln!(out, "client_secret_env = \"{env}\"");
            }
        }
    }

    out
}

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Lifeline — configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Backend URL
            let backend: String = Input::new()
                .with_prompt("Backend URL")
                .with_initial_text("https://")
                .interact_text()
                .map_err(prompt_err)?;

            // 3. API key
            let storage_choices = &[
                "Read from an environment variable (recommended)",
                "Save to config file (plaintext)",
            ];
            let storage = Select::new()
                .with_prompt("Where should the anon API key come from?")
                .items(storage_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let (api_key, api_key_env) = if storage == 0 {
                let env_name: String = Input::new()
                    .with_prompt("Environment variable name")
                    .default("LIFELINE_API_KEY".into())
                    .interact_text()
                    .map_err(prompt_err)?;
                (None, Some(env_name))
            } else {
                let key = Password::new()
                    .with_prompt("API key")
                    .interact()
                    .map_err(prompt_err)?;
                if key.is_empty() {
                    return Err(CliError::Validation {
                        field: "api_key".into(),
                        reason: "API key cannot be empty".into(),
                    });
                }
                (Some(key), None)
            };

            // 4. Operator identity (optional). Without one the session is
            // read-only plus request submission.
            let operator = if Confirm::new()
                .with_prompt("Configure an operator identity for this profile?")
                .default(true)
                .interact()
                .map_err(prompt_err)?
            {
                let name: String = Input::new()
                    .with_prompt("Operator name")
                    .interact_text()
                    .map_err(prompt_err)?;
                let discord_id: String = Input::new()
                    .with_prompt("Discord account id")
                    .interact_text()
                    .map_err(prompt_err)?;
                Some(OperatorEntry {
                    name,
                    discord_id,
                    avatar_url: None,
                })
            } else {
                None
            };

            // 5. Build profile and config
            let profile = Profile {
                backend,
                api_key,
                api_key_env,
                feed: true,
                refresh_interval_secs: 300,
                timeout: None,
                operator,
                oauth: None,
            };

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };

            // 6. Write config
            save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: lifeline dashboard");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: lifeline config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { ref name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort_unstable();
                return Err(CliError::ProfileNotFound {
                    name: name.clone(),
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }
    }
}
