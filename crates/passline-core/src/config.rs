// ── Runtime sync configuration ──
//
// Describes *how* to reach the collection store and how to notify. Carries
// the session token but never touches disk; passline-config builds a
// `SyncConfig` from profiles and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use passline_api::{StoreClient, TlsMode, TransportConfig};

use crate::error::CoreError;
use crate::notify::NotificationSettings;
use crate::store::ReconnectPolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed venue servers).
    DangerAcceptInvalid,
}

/// How live queries reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiveMode {
    #[default]
    WebSocket,
    /// List on an interval and diff client-side.
    Polling { interval: Duration },
}

/// Configuration for syncing one venue.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Store root, e.g. `https://store.example.com`.
    pub store_url: Url,
    pub venue: String,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub live_mode: LiveMode,
    pub reconnect: ReconnectPolicy,
    pub notifications: NotificationSettings,
    /// Session token from a PIN login.
    pub token: Option<SecretString>,
}

impl SyncConfig {
    pub fn new(store_url: Url, venue: impl Into<String>) -> Self {
        Self {
            store_url,
            venue: venue.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            live_mode: LiveMode::default(),
            reconnect: ReconnectPolicy::default(),
            notifications: NotificationSettings::default(),
            token: None,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            token: self.token.clone(),
        }
    }

    /// Build the HTTP client for this venue.
    pub fn client(&self) -> Result<StoreClient, CoreError> {
        if self.venue.trim().is_empty() {
            return Err(CoreError::Config {
                message: "venue must not be empty".into(),
            });
        }
        Ok(StoreClient::new(
            self.store_url.clone(),
            self.venue.clone(),
            &self.transport(),
        )?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_venue_is_rejected() {
        let config = SyncConfig::new("https://store.example.com".parse().unwrap(), "  ");
        assert!(matches!(config.client(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn transport_mirrors_tls_choice() {
        let mut config = SyncConfig::new("https://store.example.com".parse().unwrap(), "harbor");
        config.tls = TlsVerification::DangerAcceptInvalid;
        assert!(matches!(config.transport().tls, TlsMode::DangerAcceptInvalid));
        assert!(config.client().is_ok());
    }
}
