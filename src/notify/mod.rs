//! Outbound notifications.
//!
//! `Notifier` is the delivery seam (Telegram in production, a
//! recording fake in tests). Rendered messages collect in a
//! `NotificationQueue` and drain with a configurable delay between
//! sends, so pacing toward the sink is a policy rather than sleeps
//! scattered through the pass.

pub mod message;
pub mod telegram;

use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use crate::error::NotifyError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Ordered queue of rendered messages awaiting delivery.
pub struct NotificationQueue {
    pending: Vec<String>,
    delay: Duration,
}

impl NotificationQueue {
    pub fn new(delay: Duration) -> Self {
        NotificationQueue {
            pending: Vec::new(),
            delay,
        }
    }

    pub fn push(&mut self, text: String) {
        self.pending.push(text);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Send every queued message in order, pausing `delay` between
    /// consecutive sends. A failed send is logged and counted, never
    /// retried here, and never stops the rest of the queue.
    pub async fn drain(self, notifier: &dyn Notifier) -> usize {
        let total = self.pending.len();
        let mut failures = 0;

        for (i, text) in self.pending.into_iter().enumerate() {
            if let Err(e) = notifier.send(&text).await {
                error!(error = %e, "failed to deliver notification");
                failures += 1;
            }

            if i + 1 < total {
                tokio::time::sleep(self.delay).await;
            }
        }

        failures
    }
}
