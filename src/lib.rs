//! Data refresh and caching core for the SuperVaults telemetry dashboard.
//!
//! Pulls vault identity and statistics from the Superform REST API and
//! per-market lending analytics from the Morpho GraphQL API, caches both
//! with a TTL and stale fallback, and assembles them into dashboard
//! snapshots that degrade gracefully when an upstream misbehaves.
//!
//! # Architecture
//!
//! - [`provider`]: one client per upstream, behind traits
//! - [`cache`]: TTL cache with stale-on-failure fallback
//! - [`retry`]: bounded exponential backoff around every upstream call
//! - [`snapshot`]: fan-out, merge, and the partial-data policy
//! - [`settings`]: environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use supervaults_data::{
//!     DashboardSettings, MorphoProvider, SnapshotService, SuperformProvider,
//! };
//!
//! # async fn run() -> Result<(), supervaults_data::DataError> {
//! let settings = DashboardSettings::from_env()?;
//! let service = SnapshotService::new(
//!     &settings,
//!     Arc::new(SuperformProvider::new(settings.api_key.clone())),
//!     Arc::new(MorphoProvider::new()),
//! );
//! let snapshot = service.get_dashboard_snapshot(false).await;
//! println!("{} vaults", snapshot.vaults.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod errors;
pub mod models;
pub mod provider;
pub mod retry;
pub mod settings;
pub mod snapshot;

pub use cache::{CacheKey, CacheStore, Freshness};
pub use errors::{DataError, RetryClass};
pub use models::{
    AssetAllocation, DashboardSnapshot, DataStatus, MarketAllocation, MarketRecord,
    VaultAllocation, VaultFailure, VaultRecord, VaultSnapshot,
};
pub use provider::{MarketAnalyticsProvider, MorphoProvider, SuperformProvider, VaultDataProvider};
pub use retry::RetryPolicy;
pub use settings::DashboardSettings;
pub use snapshot::{spawn_refresh_task, SnapshotService};
