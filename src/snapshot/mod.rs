//! Snapshot assembly.
//!
//! [`SnapshotService`] fans out to the vault and market providers for every
//! configured vault, merges the results, and applies the partial-data
//! policy: primary-record failures exclude a vault, analytics failures
//! degrade it.

mod service;


pub use service::{spawn_refresh_task, SnapshotService};
