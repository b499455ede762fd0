//! Trailing-edge debouncer for keystroke-driven calls.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::view::Slot;

type Handler<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Collapses a burst of triggers into one handler call, made `delay` after the last trigger
/// with that trigger's value. Once the handler has started it runs to completion; only the
/// pending wait is ever cancelled.
pub struct Debouncer<T> {
    delay: Duration,
    handler: Handler<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            handler: Arc::new(move |value: T| Box::pin(handler(value)) as Pin<Box<dyn Future<Output = ()> + Send>>),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration { self.delay }

    pub fn trigger(&self, value: T) {
        self.schedule(value, None);
    }

    /// Like [`trigger`](Self::trigger), but the call is dropped if `target` has been detached
    /// by the time the delay elapses.
    pub fn trigger_for(&self, target: &Slot, value: T) {
        self.schedule(value, Some(target.clone()));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }

    fn schedule(&self, value: T, target: Option<Slot>) {
        let delay = self.delay;
        let handler = self.handler.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(target) = target {
                if !target.is_attached() {
                    debug!("Dropping debounced call for detached #{}", target.id().as_str());
                    return;
                }
            }
            tokio::spawn(handler(value));
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.get_mut().take() {
            task.abort();
        }
    }
}
