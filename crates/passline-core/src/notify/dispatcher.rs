use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{AudioPlayer, Effect, NotificationSettings, Permission, PlatformNotifier, Silent, ToastSurface};
use crate::detect::Transition;
use crate::model::Entity;

/// Outcome of delivering one transition's effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Platform notices skipped because permission was not granted.
    pub suppressed: usize,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.delivered + self.failed + self.suppressed == 0
    }
}

/// Maps transitions to side effects on the configured surfaces.
///
/// One dispatcher serves the whole process. Each collection feeds it from a
/// single consumer task, so a transition is dispatched exactly once no matter
/// how many views are mounted.
pub struct NotificationDispatcher {
    audio: Arc<dyn AudioPlayer>,
    toasts: Arc<dyn ToastSurface>,
    platform: Arc<dyn PlatformNotifier>,
    settings: NotificationSettings,
    permission: OnceCell<Permission>,
}

impl NotificationDispatcher {
    pub fn new(
        audio: Arc<dyn AudioPlayer>,
        toasts: Arc<dyn ToastSurface>,
        platform: Arc<dyn PlatformNotifier>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            audio,
            toasts,
            platform,
            settings,
            permission: OnceCell::new(),
        }
    }

    /// A dispatcher that delivers to nothing.
    pub fn silent() -> Self {
        Self::new(
            Arc::new(Silent),
            Arc::new(Silent),
            Arc::new(Silent),
            NotificationSettings::default(),
        )
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Resolve platform permission, prompting at most once per process and
    /// only when the platform reports it as undetermined.
    pub async fn ensure_permission(&self) -> Permission {
        *self
            .permission
            .get_or_init(|| async {
                match self.platform.permission() {
                    Permission::Undetermined if self.settings.os_notifications => {
                        let answer = self.platform.request_permission().await;
                        info!(permission = %answer, "notification permission requested");
                        answer
                    }
                    current => current,
                }
            })
            .await
    }

    /// The permission as last resolved, or the platform's current answer if
    /// it was never resolved.
    pub fn permission(&self) -> Permission {
        self.permission
            .get()
            .copied()
            .unwrap_or_else(|| self.platform.permission())
    }

    pub fn dispatch<T: Entity>(&self, transition: &Transition<T>) -> DispatchReport {
        let effects = T::effects(transition, &self.settings);
        if !effects.is_empty() {
            debug!(
                collection = %transition.collection,
                id = %transition.entity_id,
                kind = %transition.kind,
                effects = effects.len(),
                "dispatching transition"
            );
        }
        self.deliver(effects)
    }

    /// Deliver effects, cue first. Failures are logged and counted.
    pub fn deliver(&self, mut effects: Vec<Effect>) -> DispatchReport {
        effects.sort_by_key(|e| !matches!(e, Effect::Cue(_)));

        let mut report = DispatchReport::default();
        for effect in &effects {
            let result = match effect {
                Effect::Cue(cue) => self.audio.play(*cue),
                Effect::Toast(toast) => self.toasts.show(toast),
                Effect::Os(notice) => {
                    if self.permission() != Permission::Granted {
                        report.suppressed += 1;
                        continue;
                    }
                    self.platform.notify(notice)
                }
            };
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(surface = effect.surface(), error = %e, "side effect failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::testing::{Delivered, Recorder};
    use crate::notify::{Cue, OsNotice, Toast};

    fn notice() -> Effect {
        Effect::Os(OsNotice {
            title: "t".into(),
            body: "b".into(),
            icon: "i".into(),
        })
    }

    fn toast() -> Effect {
        Effect::Toast(Toast {
            message: "m".into(),
            duration: crate::notify::DEFAULT_TOAST_DURATION,
            action: None,
        })
    }

    #[tokio::test]
    async fn permission_requested_once_when_undetermined() {
        let recorder = Recorder::new(Permission::Undetermined);
        recorder.answer_with(Permission::Granted);
        let dispatcher = recorder.dispatcher();

        assert_eq!(dispatcher.ensure_permission().await, Permission::Granted);
        assert_eq!(dispatcher.ensure_permission().await, Permission::Granted);
        assert_eq!(recorder.requests(), 1);
    }

    #[tokio::test]
    async fn denied_is_never_prompted() {
        let recorder = Recorder::new(Permission::Denied);
        let dispatcher = recorder.dispatcher();
        assert_eq!(dispatcher.ensure_permission().await, Permission::Denied);
        assert_eq!(recorder.requests(), 0);
    }

    #[tokio::test]
    async fn os_notice_requires_grant() {
        let recorder = Recorder::new(Permission::Denied);
        let dispatcher = recorder.dispatcher();
        dispatcher.ensure_permission().await;

        let report = dispatcher.deliver(vec![Effect::Cue(Cue::OrderReady), notice()]);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.suppressed, 1);
        assert_eq!(recorder.delivered(), vec![Delivered::Cue(Cue::OrderReady)]);
    }

    #[tokio::test]
    async fn failing_surfaces_do_not_block_cue() {
        let recorder = Recorder::new(Permission::Granted);
        recorder.fail_toasts();
        recorder.fail_notices();
        let dispatcher = recorder.dispatcher();
        dispatcher.ensure_permission().await;

        // Cue listed last still plays first.
        let report = dispatcher.deliver(vec![toast(), notice(), Effect::Cue(Cue::OrderReady)]);
        assert_eq!(report, DispatchReport {
            delivered: 1,
            failed: 2,
            suppressed: 0
        });
        assert_eq!(recorder.delivered(), vec![Delivered::Cue(Cue::OrderReady)]);
    }
}
