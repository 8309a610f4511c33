//! Pass orchestration and the scheduling loop.
//!
//! One pass is load -> fetch -> reconcile -> notify -> persist, with
//! read-all-then-write-all discipline on the snapshot: the file is
//! read once at the start and replaced once at the end, never mutated
//! incrementally. Fetch failures and empty observations abort a pass
//! before durable state changes; notification and save failures are
//! reported in the summary instead.

use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use crate::config::Schedule;
use crate::error::PassError;
use crate::notify::{message, NotificationQueue, Notifier};
use crate::scrape::ListingProvider;
use crate::store::diff::{self, Event, Reconciliation};
use crate::store::snapshot::SnapshotStore;

/// What one pass observed and did. Logged after every pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub observed: usize,
    pub new_products: usize,
    pub price_changes: usize,
    pub removed: usize,
    pub notify_failures: usize,
    pub persisted: bool,
}

/// Fetch and reconcile without side effects: no notifications, no
/// snapshot write. Backs `check --dry-run`.
pub async fn preview_pass(
    provider: &dyn ListingProvider,
    store: &SnapshotStore,
) -> Result<Reconciliation, PassError> {
    let previous = store.load();
    let observed = provider.fetch_listing().await?;
    Ok(diff::reconcile(&previous, &observed)?)
}

/// Run one full pass against the live collaborators.
pub async fn run_pass(
    provider: &dyn ListingProvider,
    notifier: &dyn Notifier,
    store: &SnapshotStore,
    notify_delay: Duration,
) -> Result<PassSummary, PassError> {
    let previous = store.load();
    info!(known = previous.len(), "loaded snapshot");

    let observed = provider.fetch_listing().await?;
    info!(observed = observed.len(), "fetched listing");

    let outcome = diff::reconcile(&previous, &observed)?;

    let mut summary = PassSummary {
        observed: observed.len(),
        ..PassSummary::default()
    };

    let mut queue = NotificationQueue::new(notify_delay);
    for event in &outcome.events {
        match event {
            Event::New(record) => {
                summary.new_products += 1;
                info!(name = %record.name, link = %record.link, "new product");
            }
            Event::PriceChanged { record, old_price } => {
                summary.price_changes += 1;
                info!(
                    name = %record.name,
                    old = %old_price,
                    new = %record.price,
                    "price changed"
                );
            }
            Event::Removed(record) => {
                summary.removed += 1;
                info!(name = %record.name, link = %record.link, "product removed");
            }
        }
        queue.push(message::render(event));
    }

    summary.notify_failures = queue.drain(notifier).await;

    // the snapshot must reflect the page even when sends failed, the
    // next pass cannot re-detect what this one already absorbed
    match store.save(&outcome.current) {
        Ok(()) => {
            summary.persisted = true;
            info!(
                products = outcome.current.len(),
                path = %store.path().display(),
                "snapshot saved"
            );
        }
        Err(e) => error!(error = %e, "failed to persist snapshot"),
    }

    Ok(summary)
}

/// Run passes forever: one immediately, then one per jittered interval.
/// A failed pass is logged and the schedule carries on.
pub async fn run_loop(
    provider: &dyn ListingProvider,
    notifier: &dyn Notifier,
    store: &SnapshotStore,
    schedule: &Schedule,
) {
    loop {
        match run_pass(provider, notifier, store, schedule.notify_delay).await {
            Ok(summary) => info!(
                observed = summary.observed,
                new = summary.new_products,
                price_changes = summary.price_changes,
                removed = summary.removed,
                notify_failures = summary.notify_failures,
                persisted = summary.persisted,
                "pass complete"
            ),
            Err(PassError::EmptyObservation(_)) => {
                warn!("no products found on the page, keeping previous snapshot")
            }
            Err(e) => error!(error = %e, "pass failed"),
        }

        let wait = jittered_interval(schedule);
        info!(next_pass_in = %humantime::format_duration(wait), "sleeping");
        tokio::time::sleep(wait).await;
    }
}

/// Uniformly random whole-second duration in
/// [min_interval, max_interval].
fn jittered_interval(schedule: &Schedule) -> Duration {
    let min = schedule.min_interval.as_secs();
    let max = schedule.max_interval.as_secs();
    if min >= max {
        return schedule.min_interval;
    }
    Duration::from_secs(rand::thread_rng().gen_range(min..=max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(min: u64, max: u64) -> Schedule {
        Schedule {
            min_interval: Duration::from_secs(min),
            max_interval: Duration::from_secs(max),
            notify_delay: Duration::from_secs(1),
        }
    }

    #[test]
    fn jitter_stays_inside_the_configured_range() {
        let schedule = schedule(120, 300);

        for _ in 0..100 {
            let wait = jittered_interval(&schedule);
            assert!(wait >= Duration::from_secs(120));
            assert!(wait <= Duration::from_secs(300));
        }
    }

    #[test]
    fn degenerate_range_returns_the_minimum() {
        let schedule = schedule(60, 60);
        assert_eq!(jittered_interval(&schedule), Duration::from_secs(60));
    }
}
