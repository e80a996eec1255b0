//! Terminal-backed notification surfaces.
//!
//! The bell stands in for audio, toasts print inline, and OS notices are
//! printed as a highlighted banner once the user has allowed them.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use owo_colors::OwoColorize;

use passline_core::{
    AudioPlayer, Cue, OsNotice, Permission, PlatformNotifier, Surfaces, SurfaceError, Toast,
    ToastSurface,
};

/// Rings the terminal bell on stderr.
pub struct TerminalBell {
    enabled: bool,
}

impl AudioPlayer for TerminalBell {
    fn play(&self, cue: Cue) -> Result<(), SurfaceError> {
        if !self.enabled {
            return Ok(());
        }
        // Ready gets a double ring so it is distinguishable by ear.
        let rings = match cue {
            Cue::NewOrder => "\x07",
            Cue::OrderReady => "\x07\x07",
        };
        let mut stderr = io::stderr().lock();
        stderr
            .write_all(rings.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| SurfaceError::Failed {
                surface: "audio",
                reason: e.to_string(),
            })
    }
}

/// Prints toasts as single lines on stdout.
pub struct TerminalToasts {
    color: bool,
}

impl ToastSurface for TerminalToasts {
    fn show(&self, toast: &Toast) -> Result<(), SurfaceError> {
        let action = toast
            .action
            .as_ref()
            .map(|a| format!("  [{}]", a.label))
            .unwrap_or_default();
        let line = if self.color {
            format!("{} {}{}", "●".green(), toast.message.bold(), action.dimmed())
        } else {
            format!("* {}{action}", toast.message)
        };
        writeln!(io::stdout().lock(), "{line}").map_err(|e| SurfaceError::Failed {
            surface: "toast",
            reason: e.to_string(),
        })
    }
}

/// Banner-style notices gated behind a yes/no prompt.
pub struct TerminalNotifier {
    state: Mutex<Permission>,
    interactive: bool,
    color: bool,
}

impl TerminalNotifier {
    fn new(enabled: bool, color: bool) -> Self {
        let interactive = io::stdin().is_terminal() && io::stderr().is_terminal();
        let state = if enabled {
            Permission::Undetermined
        } else {
            Permission::Denied
        };
        Self {
            state: Mutex::new(state),
            interactive,
            color,
        }
    }

    fn set(&self, permission: Permission) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = permission;
    }
}

impl PlatformNotifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        async move {
            if !self.interactive {
                self.set(Permission::Denied);
                return Permission::Denied;
            }
            let answer = tokio::task::spawn_blocking(|| {
                dialoguer::Confirm::new()
                    .with_prompt("Show banner notices when orders are ready?")
                    .default(true)
                    .interact()
            })
            .await;
            let permission = match answer {
                Ok(Ok(true)) => Permission::Granted,
                Ok(Ok(false)) => Permission::Denied,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "permission prompt failed");
                    Permission::Denied
                }
                Err(e) => {
                    tracing::warn!(error = %e, "permission prompt task failed");
                    Permission::Denied
                }
            };
            self.set(permission);
            permission
        }
        .boxed()
    }

    fn notify(&self, notice: &OsNotice) -> Result<(), SurfaceError> {
        let line = if self.color {
            format!("{} {}", format!(" {} ", notice.title).black().on_green(), notice.body)
        } else {
            format!("[{}] {}", notice.title, notice.body)
        };
        writeln!(io::stderr().lock(), "{line}").map_err(|e| SurfaceError::Failed {
            surface: "os",
            reason: e.to_string(),
        })
    }
}

/// Build the terminal surface set.
pub fn terminal(bell: bool, banners: bool, color: bool) -> Surfaces {
    Surfaces {
        audio: Arc::new(TerminalBell { enabled: bell }),
        toasts: Arc::new(TerminalToasts { color }),
        platform: Arc::new(TerminalNotifier::new(banners, color)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_banners_start_denied() {
        let notifier = TerminalNotifier::new(false, false);
        assert_eq!(notifier.permission(), Permission::Denied);
    }

    #[tokio::test]
    async fn non_interactive_prompt_denies() {
        let notifier = TerminalNotifier {
            state: Mutex::new(Permission::Undetermined),
            interactive: false,
            color: false,
        };
        assert_eq!(notifier.request_permission().await, Permission::Denied);
        assert_eq!(notifier.permission(), Permission::Denied);
    }

    #[test]
    fn muted_bell_is_a_no_op() {
        let bell = TerminalBell { enabled: false };
        assert!(bell.play(Cue::OrderReady).is_ok());
    }
}
