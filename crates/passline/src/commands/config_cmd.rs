//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};

use passline_config::{Config, Profile};
use passline_core::ViewRole;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Render the config as TOML-like text. Tokens never live in the file, so
/// nothing needs masking beyond the env var name.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "toast_seconds = {}", cfg.defaults.toast_seconds);
    let _ = writeln!(out, "audio = {}", cfg.defaults.audio);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "store_url = \"{}\"", p.store_url);
        let _ = writeln!(out, "venue = \"{}\"", p.venue);
        if let Some(ref role) = p.role {
            let _ = writeln!(out, "role = \"{role}\"");
        }
        let _ = writeln!(out, "live_mode = \"{}\"", p.live_mode);
        if let Some(secs) = p.poll_interval_secs {
            let _ = writeln!(out, "poll_interval_secs = {secs}");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(secs) = p.toast_seconds {
            let _ = writeln!(out, "toast_seconds = {secs}");
        }
        if let Some(audio) = p.audio {
            let _ = writeln!(out, "audio = {audio}");
        }
        if let Some(os) = p.os_notifications {
            let _ = writeln!(out, "os_notifications = {os}");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn validate_store_url(raw: &str) -> Result<(), CliError> {
    let url: url::Url = raw.parse().map_err(|_| CliError::Validation {
        field: "store_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::Validation {
            field: "store_url".into(),
            reason: format!("expected http or https, got {}", url.scheme()),
        });
    }
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let store_url: String = Input::new()
        .with_prompt("Collection store URL")
        .with_initial_text(global.store_url.clone().unwrap_or_default())
        .interact_text()
        .map_err(prompt_err)?;
    validate_store_url(&store_url)?;

    let venue: String = Input::new()
        .with_prompt("Venue")
        .with_initial_text(global.venue.clone().unwrap_or_default())
        .interact_text()
        .map_err(prompt_err)?;

    let roles = ["kitchen", "server", "admin", "customer"];
    let role = Select::new()
        .with_prompt("Default view")
        .items(&roles)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let modes = ["websocket", "polling"];
    let mode = Select::new()
        .with_prompt("Live updates")
        .items(&modes)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(store_url.trim(), venue.trim());
    profile.role = roles.get(role).map(|r| (*r).to_owned());
    profile.live_mode = modes.get(mode).copied().unwrap_or("websocket").to_owned();
    if global.insecure {
        profile.insecure = Some(true);
    }
    // Parse checks happen here so a bad profile never reaches disk.
    profile.view_role()?;
    profile.live_mode()?;

    cfg.profiles.insert(name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!(
            "Saved profile '{name}' to {}\nLog in with: passline login --profile {name}",
            config::config_path().display()
        );
    }
    Ok(())
}

fn profiles(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut names: Vec<String> = cfg.profiles.keys().cloned().collect();
    names.sort();
    let default = cfg.default_profile.as_deref();
    let out = match global.output {
        crate::cli::OutputFormat::Table => names
            .iter()
            .map(|n| {
                let role = cfg
                    .profiles
                    .get(n)
                    .and_then(|p| p.view_role().ok().flatten())
                    .map_or_else(String::new, |r: ViewRole| format!(" ({r})"));
                let marker = if Some(n.as_str()) == default { "*" } else { " " };
                format!("{marker} {n}{role}")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => output::render_list(&global.output, &names, |n| ProfileRow { name: n.clone() }, Clone::clone)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(tabled::Tabled)]
struct ProfileRow {
    name: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(format_config(&cfg).trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => profiles(&config::load_config_or_default(), global),

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn formatted_config_lists_profiles_in_order() {
        let mut cfg = Config::default();
        cfg.profiles.insert("terrace".into(), Profile::new("https://b.example", "terrace"));
        let mut main = Profile::new("https://a.example", "main");
        main.role = Some("kitchen".into());
        cfg.profiles.insert("main".into(), main);

        let text = format_config(&cfg);
        let main_at = text.find("[profiles.main]").unwrap();
        let terrace_at = text.find("[profiles.terrace]").unwrap();
        assert!(main_at < terrace_at);
        assert!(text.contains("role = \"kitchen\""));
        assert!(text.contains("default_profile = \"default\""));
    }

    #[test]
    fn store_url_must_be_http() {
        assert!(validate_store_url("https://store.example.com").is_ok());
        assert!(validate_store_url("ftp://store.example.com").is_err());
        assert!(validate_store_url("not a url").is_err());
    }
}
