//! Graceful shutdown coordination.
//!
//! A level-triggered flag shared between the signal handler and the
//! orchestrator. Requesting shutdown never aborts in-flight work; the
//! orchestrator finishes the current dataset and unwinds at its next
//! cooperative check point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a shutdown flag.
pub type SharedShutdown = Arc<Shutdown>;

/// Level-triggered shutdown flag with async notification.
#[derive(Debug, Default)]
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    /// Create a new shutdown flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new shared flag wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Wakes all current waiters; idempotent.
    pub fn request(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn notified(&self) {
        // Register as a waiter before checking the flag: a request landing
        // between the check and the registration would otherwise be lost,
        // since `notify_waiters` only wakes waiters that already exist.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}
