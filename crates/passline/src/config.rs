//! CLI configuration: a thin layer over `passline_config` that applies
//! `GlobalOpts` flag overrides (--store-url, --venue, --insecure, ...).

use std::time::Duration;

use passline_config::{Config, Profile};
use passline_core::{SyncConfig, TlsVerification, ViewRole};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use passline_config::{config_path, load_config_or_default, save_config};

/// The profile in effect for one invocation, after flag overrides.
pub struct Resolved {
    pub name: String,
    pub profile: Profile,
    pub sync: SyncConfig,
}

impl Resolved {
    pub fn role(&self) -> Result<Option<ViewRole>, CliError> {
        Ok(self.profile.view_role()?)
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the runtime config from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--store-url` and `--venue` must both be given.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None => match (&global.store_url, &global.venue) {
            (Some(url), Some(venue)) => Profile::new(url.clone(), venue.clone()),
            _ => {
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
        },
    };

    if let Some(url) = &global.store_url {
        profile.store_url.clone_from(url);
    }
    if let Some(venue) = &global.venue {
        profile.venue.clone_from(venue);
    }

    let mut sync = passline_config::profile_to_sync_config(&profile, &name, &cfg.defaults)?;
    if global.insecure {
        sync.tls = TlsVerification::DangerAcceptInvalid;
    }
    if profile.timeout.is_none() {
        sync.timeout = Duration::from_secs(global.timeout);
    }

    Ok(Resolved {
        name,
        profile,
        sync,
    })
}
