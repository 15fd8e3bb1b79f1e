//! Data model for the dashboard data core.
//!
//! Raw provider records ([`VaultRecord`], [`MarketRecord`]) are what the
//! upstreams return and what the caches store; snapshot types
//! ([`DashboardSnapshot`], [`VaultSnapshot`]) are the merged views the
//! aggregation layer assembles from them.

mod records;
mod snapshot;
mod types;

pub use records::{MarketAllocation, MarketRecord, VaultAllocation, VaultRecord};
pub use snapshot::{AssetAllocation, DashboardSnapshot, DataStatus, VaultFailure, VaultSnapshot};
pub use types::{ChainId, MarketId, VaultId};
