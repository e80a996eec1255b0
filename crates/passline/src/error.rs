//! CLI error types with miette diagnostics.
//!
//! Maps core, config, and login failures into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use passline_config::ConfigError;
use passline_core::{AuthRejection, CoreError, FeedError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the collection store at {url}: {reason}")]
    #[diagnostic(
        code(passline::connection_failed),
        help(
            "Check that the store is reachable and the URL is right.\n\
             Self-signed certificates need --insecure or ca_cert in the profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Live feed failed: {message}")]
    #[diagnostic(
        code(passline::feed),
        help("The store dropped the live query. Try --verbose for the feed log.")
    )]
    Feed { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(passline::auth_failed),
        help("Log in again with: passline login --profile {profile}")
    )]
    AuthFailed { profile: String, message: String },

    #[error("Session for profile '{profile}' has expired")]
    #[diagnostic(
        code(passline::session_expired),
        help("Log in again with: passline login --profile {profile}")
    )]
    SessionExpired { profile: String },

    #[error("Login rejected: {reason}")]
    #[diagnostic(code(passline::login_rejected))]
    LoginRejected { reason: AuthRejection },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(passline::not_found),
        help("Run: passline {resource_type} list")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Store rejected the request: {message}")]
    #[diagnostic(code(passline::rejected))]
    Rejected { message: String },

    #[error("Store error{}: {message}", .status.map_or_else(String::new, |s| format!(" ({s})")))]
    #[diagnostic(code(passline::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(passline::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(passline::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: passline config init\n\
             Or pass --store-url and --venue directly."
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(passline::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(passline::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Timed out after {seconds}s waiting for {collection}")]
    #[diagnostic(
        code(passline::timeout),
        help("Increase timeout with --timeout or check the store's responsiveness.")
    )]
    Timeout { seconds: u64, collection: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(passline::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Feed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::SessionExpired { .. } | Self::LoginRejected { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to auth errors raised without one.
    pub fn for_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: name.into(),
                message,
            },
            Self::SessionExpired { .. } => Self::SessionExpired {
                profile: name.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::SessionExpired => Self::SessionExpired {
                profile: "current".into(),
            },

            CoreError::Feed(feed) => feed.into(),

            CoreError::NotFound { collection, id } => Self::NotFound {
                resource_type: collection.to_string(),
                identifier: id,
            },

            CoreError::Rejected { message } => Self::Rejected { message },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { message, status } => Self::ApiError { status, message },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::NoRuntime => Self::Internal(CoreError::NoRuntime.to_string()),

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<FeedError> for CliError {
    fn from(err: FeedError) -> Self {
        Self::Feed {
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            other => Self::Config(other),
        }
    }
}

impl From<AuthRejection> for CliError {
    fn from(reason: AuthRejection) -> Self {
        Self::LoginRejected { reason }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passline_core::Collection;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let not_found: CliError = CoreError::NotFound {
            collection: Collection::Staff,
            id: "s-1".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(not_found.to_string(), "staff 's-1' not found");

        let feed: CliError = CoreError::Feed(FeedError::Connection("refused".into())).into();
        assert_eq!(feed.exit_code(), exit_code::CONNECTION);

        let expired: CliError = CoreError::SessionExpired.into();
        assert_eq!(expired.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn auth_errors_carry_profile() {
        let err: CliError = CoreError::AuthenticationFailed {
            message: "bad token".into(),
        }
        .into();
        let err = err.for_profile("bistro");
        assert!(matches!(err, CliError::AuthFailed { ref profile, .. } if profile == "bistro"));
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let err: CliError = ConfigError::UnknownProfile { name: "x".into() }.into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn api_error_shows_status() {
        let err = CliError::ApiError {
            status: Some(502),
            message: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "Store error (502): bad gateway");
    }
}
