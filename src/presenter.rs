//! Transient UI feedback: toasts and loading indicators.
//!
//! A toast is a short sequence of named phases driven by one task. The page presenter owns
//! those tasks and aborts them when a newer toast replaces the old one or when it is dropped.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::{render, view::Slot};

pub const LOADING_STEPS: [&str; 5] = [
    "Analyzing your idea...",
    "Gathering reference images...",
    "Generating creative variations...",
    "Preparing visualization...",
    "Finalizing results...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingIndicator {
    /// Inline spinner with a message.
    Indicator(String),
    /// Full-screen overlay listing the staged loading messages.
    Overlay,
    MiniLoader(String),
}

/// Collaborator the handlers report progress and outcomes to.
pub trait Presenter: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
    fn show_loading(&self, indicator: LoadingIndicator);
    fn hide_loading(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Entering,
    Shown,
    Leaving,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTimings {
    pub enter: Duration,
    pub shown: Duration,
    pub leave: Duration,
}

impl Default for ToastTimings {
    fn default() -> Self {
        Self {
            enter: Duration::from_millis(100),
            shown: Duration::from_millis(3000),
            leave: Duration::from_millis(300),
        }
    }
}

impl ToastTimings {
    fn hold(&self, phase: ToastPhase) -> Duration {
        match phase {
            ToastPhase::Entering => self.enter,
            ToastPhase::Shown => self.shown,
            ToastPhase::Leaving => self.leave,
            ToastPhase::Removed => Duration::ZERO,
        }
    }
}

/// Walk a toast through its phases, calling `on_phase` on entry to each one.
pub async fn play_toast(timings: ToastTimings, mut on_phase: impl FnMut(ToastPhase)) {
    for phase in [ToastPhase::Entering, ToastPhase::Shown, ToastPhase::Leaving] {
        on_phase(phase);
        tokio::time::sleep(timings.hold(phase)).await;
    }
    on_phase(ToastPhase::Removed);
}

struct ActiveToast {
    id: Uuid,
    task: JoinHandle<()>,
}

/// Presenter that renders into the page's notification and loading elements.
pub struct PagePresenter {
    notifications: Slot,
    loading: Slot,
    timings: ToastTimings,
    active: Mutex<Option<ActiveToast>>,
}

impl PagePresenter {
    pub fn new(notifications: Slot, loading: Slot) -> Self {
        Self::with_timings(notifications, loading, ToastTimings::default())
    }

    pub fn with_timings(notifications: Slot, loading: Slot, timings: ToastTimings) -> Self {
        Self { notifications, loading, timings, active: Mutex::new(None) }
    }

    /// Abort any running toast and clear it from the page.
    pub fn teardown(&self) {
        if let Some(toast) = self.active.lock().take() {
            toast.task.abort();
            self.notifications.set_html("");
        }
    }
}

impl Presenter for PagePresenter {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error => error!("🔔 {}", message),
            _ => info!("🔔 {}", message),
        }

        let id = Uuid::new_v4();
        let slot = self.notifications.clone();
        let message = message.to_string();
        let timings = self.timings;
        let task = tokio::spawn(async move {
            play_toast(timings, |phase| slot.set_html(render::render_notification(kind, &message, phase))).await;
        });

        if let Some(previous) = self.active.lock().replace(ActiveToast { id, task }) {
            previous.task.abort();
        }
    }

    fn show_loading(&self, indicator: LoadingIndicator) {
        self.loading.set_html(render::render_loading(&indicator));
    }

    fn hide_loading(&self) {
        self.loading.set_html("");
    }
}

impl Drop for PagePresenter {
    fn drop(&mut self) {
        if let Some(toast) = self.active.get_mut().take() {
            info!("Tearing down toast {}", toast.id);
            toast.task.abort();
        }
    }
}
