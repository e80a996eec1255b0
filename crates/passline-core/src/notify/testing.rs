// Recording surfaces for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use super::{
    AudioPlayer, Cue, NotificationDispatcher, NotificationSettings, OsNotice, Permission,
    PlatformNotifier, SurfaceError, Toast, ToastSurface,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Delivered {
    Cue(Cue),
    Toast(String),
    Os(String),
}

pub(crate) struct Recorder {
    delivered: Mutex<Vec<Delivered>>,
    permission: Mutex<Permission>,
    answer: Mutex<Permission>,
    requests: AtomicUsize,
    fail_toasts: AtomicBool,
    fail_notices: AtomicBool,
    crash_toasts: AtomicBool,
}

impl Recorder {
    pub(crate) fn new(permission: Permission) -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            permission: Mutex::new(permission),
            answer: Mutex::new(Permission::Denied),
            requests: AtomicUsize::new(0),
            fail_toasts: AtomicBool::new(false),
            fail_notices: AtomicBool::new(false),
            crash_toasts: AtomicBool::new(false),
        })
    }

    pub(crate) fn dispatcher(self: &Arc<Self>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            Arc::clone(self) as Arc<dyn AudioPlayer>,
            Arc::clone(self) as Arc<dyn ToastSurface>,
            Arc::clone(self) as Arc<dyn PlatformNotifier>,
            NotificationSettings::default(),
        )
    }

    pub(crate) fn answer_with(&self, answer: Permission) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = answer;
    }

    pub(crate) fn fail_toasts(&self) {
        self.fail_toasts.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_notices(&self) {
        self.fail_notices.store(true, Ordering::SeqCst);
    }

    /// Make the toast surface panic instead of returning an error.
    pub(crate) fn crash_toasts(&self) {
        self.crash_toasts.store(true, Ordering::SeqCst);
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, item: Delivered) {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).push(item);
    }
}

impl AudioPlayer for Recorder {
    fn play(&self, cue: Cue) -> Result<(), SurfaceError> {
        self.record(Delivered::Cue(cue));
        Ok(())
    }
}

impl ToastSurface for Recorder {
    fn show(&self, toast: &Toast) -> Result<(), SurfaceError> {
        assert!(!self.crash_toasts.load(Ordering::SeqCst), "toast renderer crashed");
        if self.fail_toasts.load(Ordering::SeqCst) {
            return Err(SurfaceError::Failed {
                surface: "toast",
                reason: "renderer gone".into(),
            });
        }
        self.record(Delivered::Toast(toast.message.clone()));
        Ok(())
    }
}

impl PlatformNotifier for Recorder {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let answer = *self.answer.lock().unwrap_or_else(PoisonError::into_inner);
            *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = answer;
            answer
        }
        .boxed()
    }

    fn notify(&self, notice: &OsNotice) -> Result<(), SurfaceError> {
        if self.fail_notices.load(Ordering::SeqCst) {
            return Err(SurfaceError::Unavailable {
                surface: "platform",
                reason: "no notification daemon".into(),
            });
        }
        self.record(Delivered::Os(notice.title.clone()));
        Ok(())
    }
}
