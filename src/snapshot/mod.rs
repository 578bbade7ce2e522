//! Snapshot persistence
//!
//! Serializes an assembled season snapshot either into fixture records
//! (bulk-load JSON files) or directly into the domain store. Persistence is
//! delete-then-insert per season inside one transaction: re-running a
//! season yields the identical row set, and a failed run commits nothing.

pub mod fixture;
pub mod writer;

pub use fixture::{FixtureRecord, fixtures, load_fixture_dir, write_fixture_dir};
pub use writer::{PersistedCounts, SnapshotWriter};
