use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;

use crate::surface::{Element, Surface};

/// How long an error banner stays up.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// What happens to a pending auto-hide when another error is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorDismissal {
    /// Every error schedules its own hide timer. An earlier timer can hide a
    /// later message before its full display time.
    #[default]
    Independent,
    /// A new error cancels the pending hide before scheduling its own.
    CancelPending,
}

/// Cancels one scheduled banner hide.
#[derive(Debug)]
pub struct DismissHandle {
    task: AbortHandle,
}

impl DismissHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Shows errors and brackets fetches with the loading state.
pub struct Presenter {
    surface: Arc<dyn Surface>,
    dismissal: ErrorDismissal,
    pending_hide: Mutex<Option<AbortHandle>>,
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter").field("dismissal", &self.dismissal).finish_non_exhaustive()
    }
}

impl Presenter {
    pub fn new(surface: Arc<dyn Surface>, dismissal: ErrorDismissal) -> Self {
        Self { surface, dismissal, pending_hide: Mutex::new(None) }
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    /// Replace the banner text, show it, and hide it again after [`ERROR_DISPLAY`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn show_error(&self, message: &str) -> DismissHandle {
        if self.dismissal == ErrorDismissal::CancelPending {
            if let Some(previous) = self.pending_slot().take() {
                previous.abort();
            }
        }

        self.surface.set_text(Element::Error, message);
        self.surface.set_visible(Element::Error, true);

        let surface = Arc::clone(&self.surface);
        let hide = tokio::spawn(async move {
            tokio::time::sleep(ERROR_DISPLAY).await;
            surface.set_visible(Element::Error, false);
        });

        if self.dismissal == ErrorDismissal::CancelPending {
            *self.pending_slot() = Some(hide.abort_handle());
        }

        DismissHandle { task: hide.abort_handle() }
    }

    /// Enter the loading state. It ends when the returned guard is dropped.
    pub fn begin_loading(&self) -> LoadingGuard {
        self.surface.set_visible(Element::Results, false);
        self.surface.set_visible(Element::Error, false);
        self.surface.set_visible(Element::Loading, true);
        self.surface.set_enabled(false);

        LoadingGuard { surface: Arc::clone(&self.surface) }
    }

    fn pending_slot(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.pending_hide.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Hides the loading indicator and re-enables the trigger on drop.
#[must_use = "the loading state ends as soon as the guard is dropped"]
pub struct LoadingGuard {
    surface: Arc<dyn Surface>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.surface.set_visible(Element::Loading, false);
        self.surface.set_enabled(true);
    }
}
