// ── Notification dispatch ──
//
// Transitions become side effects here: an audible cue, an in-app toast,
// and a platform notification gated by the user's permission. Delivery is
// best-effort; a failing surface is logged and never blocks the others.

mod dispatcher;
pub mod policy;
mod surface;
#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use surface::{AudioPlayer, Permission, PlatformNotifier, Silent, SurfaceError, ToastSurface};

/// Default on-screen time for a toast.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(10);

/// Audible cues the audio surface knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Cue {
    NewOrder,
    OrderReady,
}

/// The single acknowledgement action a toast may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastAction {
    pub label: String,
}

/// A dismissible in-app message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub duration: Duration,
    pub action: Option<ToastAction>,
}

/// A platform-level notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsNotice {
    pub title: String,
    pub body: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Cue(Cue),
    Toast(Toast),
    Os(OsNotice),
}

impl Effect {
    pub fn surface(&self) -> &'static str {
        match self {
            Self::Cue(_) => "audio",
            Self::Toast(_) => "toast",
            Self::Os(_) => "platform",
        }
    }
}

/// User-tunable delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub toast_duration: Duration,
    pub audio: bool,
    pub os_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            toast_duration: DEFAULT_TOAST_DURATION,
            audio: true,
            os_notifications: true,
        }
    }
}
