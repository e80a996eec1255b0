//! Shared configuration for passline tools.
//!
//! TOML profiles, session token storage (env + keyring), and translation to
//! `passline_core::SyncConfig`. The CLI layers flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use passline_core::{LiveMode, NotificationSettings, SyncConfig, TlsVerification, ViewRole};

const KEYRING_SERVICE: &str = "passline";

/// Fallback env var holding a session token for any profile.
pub const TOKEN_ENV: &str = "PASSLINE_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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

    /// Named venue profiles.
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
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned();
        let profile = self
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.clone() })?;
        Ok((name, profile))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_toast_seconds")]
    pub toast_seconds: u64,

    #[serde(default = "default_true")]
    pub audio: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            toast_seconds: default_toast_seconds(),
            audio: true,
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
fn default_toast_seconds() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

/// A named venue profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Collection store root (e.g., "https://store.example.com").
    pub store_url: String,

    /// Venue identifier on the store.
    pub venue: String,

    /// View role used by `watch` when none is given: kitchen, server,
    /// admin, or customer.
    pub role: Option<String>,

    /// "websocket" or "polling".
    #[serde(default = "default_live_mode")]
    pub live_mode: String,

    /// Poll interval when `live_mode = "polling"`.
    pub poll_interval_secs: Option<u64>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override toast duration.
    pub toast_seconds: Option<u64>,

    /// Override audible cues.
    pub audio: Option<bool>,

    /// Whether to use platform notifications at all.
    pub os_notifications: Option<bool>,

    /// Environment variable name containing a session token.
    pub token_env: Option<String>,
}

fn default_live_mode() -> String {
    "websocket".into()
}

impl Profile {
    pub fn new(store_url: impl Into<String>, venue: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            venue: venue.into(),
            role: None,
            live_mode: default_live_mode(),
            poll_interval_secs: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            toast_seconds: None,
            audio: None,
            os_notifications: None,
            token_env: None,
        }
    }

    pub fn view_role(&self) -> Result<Option<ViewRole>, ConfigError> {
        self.role
            .as_deref()
            .map(|raw| {
                raw.parse().map_err(|_| ConfigError::Validation {
                    field: "role".into(),
                    reason: format!("expected kitchen, server, admin, or customer, got '{raw}'"),
                })
            })
            .transpose()
    }

    pub fn live_mode(&self) -> Result<LiveMode, ConfigError> {
        match self.live_mode.as_str() {
            "websocket" => Ok(LiveMode::WebSocket),
            "polling" => Ok(LiveMode::Polling {
                interval: Duration::from_secs(self.poll_interval_secs.unwrap_or(5).max(1)),
            }),
            other => Err(ConfigError::Validation {
                field: "live_mode".into(),
                reason: format!("expected 'websocket' or 'polling', got '{other}'"),
            }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "passline", "passline").map_or_else(
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
    p.push("passline");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file: defaults, then TOML, then `PASSLINE_` env
/// (nested keys separated by `__`, e.g. `PASSLINE_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PASSLINE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session tokens ──────────────────────────────────────────────────

fn token_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/session"))?)
}

/// Resolve a session token: profile's `token_env`, then `PASSLINE_TOKEN`,
/// then the system keyring. `None` means not logged in.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(val) = profile.token_env.as_deref().and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(val));
    }

    if let Ok(val) = std::env::var(TOKEN_ENV) {
        return Some(SecretString::from(val));
    }

    token_entry(profile_name)
        .ok()
        .and_then(|entry| entry.get_password().ok())
        .map(SecretString::from)
}

pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    token_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

/// Remove a stored token. Returns `false` if none was stored.
pub fn clear_token(profile_name: &str) -> Result<bool, ConfigError> {
    match token_entry(profile_name)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `SyncConfig` from a profile, with global defaults filling gaps.
/// No CLI flag overrides; the token is resolved from env and keyring.
pub fn profile_to_sync_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SyncConfig, ConfigError> {
    let store_url: url::Url = profile.store_url.parse().map_err(|_| ConfigError::Validation {
        field: "store_url".into(),
        reason: format!("invalid URL: {}", profile.store_url),
    })?;

    if profile.venue.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "venue".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = SyncConfig::new(store_url, profile.venue.clone());
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.live_mode = profile.live_mode()?;
    config.notifications = NotificationSettings {
        toast_duration: Duration::from_secs(profile.toast_seconds.unwrap_or(defaults.toast_seconds)),
        audio: profile.audio.unwrap_or(defaults.audio),
        os_notifications: profile.os_notifications.unwrap_or(true),
    };
    config.token = resolve_token(profile, profile_name);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_profile = "harbor"

[defaults]
timeout = 12
toast_seconds = 6

[profiles.harbor]
store_url = "https://store.example.com"
venue = "harbor-bistro"
role = "kitchen"
live_mode = "polling"
poll_interval_secs = 3
audio = false
"#;

    #[test]
    fn loads_profiles_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load_config_from(&path).unwrap();
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "harbor");
        assert_eq!(profile.venue, "harbor-bistro");
        assert_eq!(profile.view_role().unwrap(), Some(ViewRole::Kitchen));
        assert_eq!(config.defaults.timeout, 12);
        assert_eq!(config.defaults.output, "table");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.profiles.is_empty());
        assert_eq!(config.defaults.toast_seconds, 10);
        assert!(matches!(config.profile(None), Err(ConfigError::UnknownProfile { .. })));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        let mut profile = Profile::new("http://localhost:8080", "dev");
        profile.role = Some("admin".into());
        config.profiles.insert("default".into(), profile);
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, profile) = loaded.profile(Some("default")).unwrap();
        assert_eq!(profile.store_url, "http://localhost:8080");
        assert_eq!(profile.live_mode, "websocket");
    }

    #[test]
    fn profile_translates_to_sync_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = load_config_from(&path).unwrap();
        let (name, profile) = config.profile(None).unwrap();

        let sync = profile_to_sync_config(profile, &name, &config.defaults).unwrap();
        assert_eq!(sync.venue, "harbor-bistro");
        assert_eq!(sync.timeout, Duration::from_secs(12));
        assert_eq!(sync.live_mode, LiveMode::Polling {
            interval: Duration::from_secs(3)
        });
        assert_eq!(sync.notifications.toast_duration, Duration::from_secs(6));
        assert!(!sync.notifications.audio);
        assert_eq!(sync.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn rejects_bad_values() {
        let defaults = Defaults::default();
        let bad_url = Profile::new("not a url", "v");
        assert!(matches!(
            profile_to_sync_config(&bad_url, "x", &defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "store_url"
        ));

        let mut bad_mode = Profile::new("https://store.example.com", "v");
        bad_mode.live_mode = "carrier-pigeon".into();
        assert!(bad_mode.live_mode().is_err());

        let mut bad_role = Profile::new("https://store.example.com", "v");
        bad_role.role = Some("sommelier".into());
        assert!(bad_role.view_role().is_err());
    }
}
