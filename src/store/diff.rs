//! Snapshot reconciliation engine.
//!
//! Compares the persisted snapshot against the records observed on the
//! page and reports changes:
//! - New: link never seen before
//! - PriceChanged: known link whose price text moved
//! - Removed: link that fell off the page entirely

use thiserror::Error;

use crate::scrape::{ProductRecord, PRICE_PLACEHOLDER};
use crate::store::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    New(ProductRecord),
    PriceChanged {
        record: ProductRecord,
        old_price: String,
    },
    Removed(ProductRecord),
}

/// Outcome of one reconciliation: the snapshot to persist and the
/// events to notify, in detection order.
#[derive(Debug)]
pub struct Reconciliation {
    pub current: Snapshot,
    pub events: Vec<Event>,
}

/// Zero records observed. Diffing would report the whole catalog as
/// removed and wipe the snapshot, so the pass is refused instead; a
/// markup change or a broken page should leave durable state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no products observed on the page, keeping the previous snapshot")]
pub struct EmptyObservation;

/// Diff `observed` (in page order) against `previous`.
///
/// Pure and total apart from the empty-observation guard: no I/O and
/// no other failure mode.
pub fn reconcile(
    previous: &Snapshot,
    observed: &[ProductRecord],
) -> Result<Reconciliation, EmptyObservation> {
    if observed.is_empty() {
        return Err(EmptyObservation);
    }

    let mut current = Snapshot::new();
    let mut events = Vec::new();

    for record in observed {
        if current.contains(&record.link) {
            // duplicate link within one page: last record wins, the
            // first occurrence already produced any event
            current.insert(record.clone());
            continue;
        }

        match previous.get(&record.link) {
            None => events.push(Event::New(record.clone())),
            Some(prev) => {
                // a placeholder price is a parse failure, not a price
                // move; a real price replacing a placeholder does fire
                if record.price != prev.price && record.price != PRICE_PLACEHOLDER {
                    events.push(Event::PriceChanged {
                        record: record.clone(),
                        old_price: prev.price.clone(),
                    });
                }
            }
        }

        current.insert(record.clone());
    }

    // links that fell off the page, sorted so event order is stable
    let mut removed: Vec<&str> = previous
        .links()
        .filter(|link| !current.contains(link))
        .collect();
    removed.sort_unstable();

    for link in removed {
        if let Some(old) = previous.get(link) {
            events.push(Event::Removed(old.clone()));
        }
    }

    Ok(Reconciliation { current, events })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(link: &str, price: &str) -> ProductRecord {
        ProductRecord {
            link: format!("https://shop.example/products/{link}"),
            name: format!("Product {link}"),
            price: price.to_string(),
        }
    }

    fn snapshot(records: &[ProductRecord]) -> Snapshot {
        Snapshot::from_records(records.to_vec())
    }

    #[test]
    fn identical_pass_yields_no_events() {
        let records = vec![record("a", "10"), record("b", "20")];
        let previous = snapshot(&records);

        let outcome = reconcile(&previous, &records).unwrap();

        assert!(outcome.events.is_empty());
        assert_eq!(outcome.current, previous);
    }

    #[test]
    fn unknown_link_is_new() {
        let previous = snapshot(&[record("a", "10")]);
        let observed = vec![record("a", "10"), record("b", "20")];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert_eq!(outcome.events, vec![Event::New(record("b", "20"))]);
        assert!(outcome.current.contains("https://shop.example/products/b"));
    }

    #[test]
    fn price_move_fires_once_with_old_price() {
        let previous = snapshot(&[record("a", "10")]);
        let observed = vec![record("a", "12")];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert_eq!(
            outcome.events,
            vec![Event::PriceChanged {
                record: record("a", "12"),
                old_price: "10".to_string(),
            }]
        );
    }

    #[test]
    fn placeholder_price_never_fires_but_lands_in_snapshot() {
        let previous = snapshot(&[record("a", "10")]);
        let observed = vec![record("a", PRICE_PLACEHOLDER)];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert!(outcome.events.is_empty());
        assert_eq!(
            outcome
                .current
                .get("https://shop.example/products/a")
                .unwrap()
                .price,
            PRICE_PLACEHOLDER
        );
    }

    #[test]
    fn price_discovered_after_placeholder_fires() {
        let previous = snapshot(&[record("a", PRICE_PLACEHOLDER)]);
        let observed = vec![record("a", "15")];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert_eq!(
            outcome.events,
            vec![Event::PriceChanged {
                record: record("a", "15"),
                old_price: PRICE_PLACEHOLDER.to_string(),
            }]
        );
    }

    #[test]
    fn vanished_link_is_removed_and_not_carried_over() {
        let previous = snapshot(&[record("a", "10"), record("b", "20")]);
        let observed = vec![record("a", "10")];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert_eq!(outcome.events, vec![Event::Removed(record("b", "20"))]);
        assert_eq!(outcome.current.len(), 1);
        assert!(!outcome.current.contains("https://shop.example/products/b"));
    }

    #[test]
    fn removals_are_sorted_by_link() {
        let previous = snapshot(&[record("c", "1"), record("a", "2"), record("b", "3")]);
        let observed = vec![record("z", "9")];

        let outcome = reconcile(&previous, &observed).unwrap();

        let removed_links: Vec<&str> = outcome
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Removed(r) => Some(r.link.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(
            removed_links,
            vec![
                "https://shop.example/products/a",
                "https://shop.example/products/b",
                "https://shop.example/products/c",
            ]
        );
    }

    #[test]
    fn empty_observation_refused() {
        let previous = snapshot(&[record("a", "10")]);

        assert!(matches!(reconcile(&previous, &[]), Err(EmptyObservation)));
    }

    #[test]
    fn duplicate_link_in_batch_keeps_last_without_second_event() {
        let previous = snapshot(&[]);
        let first = record("a", "10");
        let last = ProductRecord {
            price: "12".to_string(),
            ..record("a", "10")
        };
        let observed = vec![first.clone(), last.clone()];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert_eq!(outcome.events, vec![Event::New(first)]);
        assert_eq!(
            outcome
                .current
                .get("https://shop.example/products/a")
                .unwrap()
                .price,
            "12"
        );
    }

    #[test]
    fn new_and_changed_events_follow_page_order() {
        let previous = snapshot(&[record("a", "10"), record("b", "20")]);
        let observed = vec![record("b", "25"), record("x", "1"), record("a", "11")];

        let outcome = reconcile(&previous, &observed).unwrap();

        assert_eq!(
            outcome.events,
            vec![
                Event::PriceChanged {
                    record: record("b", "25"),
                    old_price: "20".to_string(),
                },
                Event::New(record("x", "1")),
                Event::PriceChanged {
                    record: record("a", "11"),
                    old_price: "10".to_string(),
                },
            ]
        );
    }
}
