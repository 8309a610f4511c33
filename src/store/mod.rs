//! Snapshot persistence and reconciliation.
//!
//! The snapshot is a map keyed by product link in memory and a plain
//! list of records on disk; `Snapshot::from_records`/`to_records` are
//! the only place that impedance mismatch lives.
//!
//! Supports:
//! - Loading the persisted snapshot (missing or corrupt file reads as empty)
//! - Atomic replace on save (temp file + rename, never a partial write)
//! - Diffing a snapshot against freshly observed records

pub mod diff;
pub mod snapshot;
