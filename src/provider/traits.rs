use async_trait::async_trait;

use crate::errors::DataError;
use crate::models::{MarketRecord, VaultRecord};

/// Source of vault records (identity, TVL, yield rates, allocations).
#[async_trait]
pub trait VaultDataProvider: Send + Sync {
    /// Stable identifier for this upstream, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetch a single vault by its upstream id.
    async fn fetch_vault(&self, vault_id: &str) -> Result<VaultRecord, DataError>;

    /// Fetch the full vault directory.
    async fn fetch_vaults(&self) -> Result<Vec<VaultRecord>, DataError>;
}

/// Source of per-market lending analytics for a protocol vault.
#[async_trait]
pub trait MarketAnalyticsProvider: Send + Sync {
    /// Stable identifier for this upstream, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetch lending-market state for the vault at `market_id` (the vault's
    /// on-chain address).
    async fn fetch_market(&self, market_id: &str) -> Result<MarketRecord, DataError>;
}
