use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use thiserror::Error;

use super::{Cue, OsNotice, Toast};

/// Platform notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    Undetermined,
    Granted,
    Denied,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("{surface} surface unavailable: {reason}")]
    Unavailable { surface: &'static str, reason: String },

    #[error("{surface} surface failed: {reason}")]
    Failed { surface: &'static str, reason: String },
}

/// Fire-and-forget audio playback.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, cue: Cue) -> Result<(), SurfaceError>;
}

/// In-app transient messages.
pub trait ToastSurface: Send + Sync {
    fn show(&self, toast: &Toast) -> Result<(), SurfaceError>;
}

/// OS-level notifications behind a three-state permission.
pub trait PlatformNotifier: Send + Sync {
    fn permission(&self) -> Permission;

    /// Prompt the user. Resolves to the state after the prompt.
    fn request_permission(&self) -> BoxFuture<'_, Permission>;

    fn notify(&self, notice: &OsNotice) -> Result<(), SurfaceError>;
}

/// A surface that accepts everything and shows nothing. Platform permission
/// is always denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioPlayer for Silent {
    fn play(&self, _cue: Cue) -> Result<(), SurfaceError> {
        Ok(())
    }
}

impl ToastSurface for Silent {
    fn show(&self, _toast: &Toast) -> Result<(), SurfaceError> {
        Ok(())
    }
}

impl PlatformNotifier for Silent {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        futures_util::future::ready(Permission::Denied).boxed()
    }

    fn notify(&self, _notice: &OsNotice) -> Result<(), SurfaceError> {
        Ok(())
    }
}
