use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{CacheKey, CacheStore, Clock, Fetched, Freshness};
use crate::errors::DataError;
use crate::models::{
    AssetAllocation, DashboardSnapshot, DataStatus, MarketRecord, VaultFailure, VaultRecord,
    VaultSnapshot,
};
use crate::provider::{MarketAnalyticsProvider, VaultDataProvider};
use crate::retry::RetryPolicy;
use crate::settings::DashboardSettings;

/// Assembles dashboard snapshots from the vault and market providers,
/// caching each upstream record independently.
///
/// A snapshot is always produced: vaults whose primary record cannot be
/// fetched are excluded and recorded as failures, and a vault whose market
/// analytics are unavailable is included with [`DataStatus::Partial`].
pub struct SnapshotService {
    vault_provider: Arc<dyn VaultDataProvider>,
    market_provider: Arc<dyn MarketAnalyticsProvider>,
    vault_cache: CacheStore<VaultRecord>,
    market_cache: CacheStore<MarketRecord>,
    retry: RetryPolicy,
    vault_ids: Vec<String>,
    clock: Arc<dyn Clock>,
}

enum VaultOutcome {
    Ready {
        snapshot: VaultSnapshot,
        served_stale: bool,
    },
    Failed {
        vault_id: String,
        error: DataError,
    },
}

impl SnapshotService {
    pub fn new(
        settings: &DashboardSettings,
        vault_provider: Arc<dyn VaultDataProvider>,
        market_provider: Arc<dyn MarketAnalyticsProvider>,
    ) -> Self {
        Self::with_clock(
            settings,
            vault_provider,
            market_provider,
            Arc::new(crate::cache::SystemClock),
        )
    }

    pub fn with_clock(
        settings: &DashboardSettings,
        vault_provider: Arc<dyn VaultDataProvider>,
        market_provider: Arc<dyn MarketAnalyticsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vault_provider,
            market_provider,
            vault_cache: CacheStore::with_clock(settings.cache_ttl, clock.clone()),
            market_cache: CacheStore::with_clock(settings.cache_ttl, clock.clone()),
            retry: settings.retry,
            vault_ids: settings.vault_ids.clone(),
            clock,
        }
    }

    /// Builds a snapshot covering every configured vault.
    ///
    /// With `force_refresh` the caches are bypassed (though a failed refresh
    /// still falls back to an expired entry when one exists).
    pub async fn get_dashboard_snapshot(&self, force_refresh: bool) -> DashboardSnapshot {
        let outcomes = join_all(
            self.vault_ids
                .iter()
                .map(|id| self.build_vault(id, force_refresh)),
        )
        .await;

        let mut vaults = HashMap::new();
        let mut failures = Vec::new();
        let mut stale = false;

        for outcome in outcomes {
            match outcome {
                VaultOutcome::Ready {
                    snapshot,
                    served_stale,
                } => {
                    stale |= served_stale;
                    vaults.insert(snapshot.id.clone(), snapshot);
                }
                VaultOutcome::Failed { vault_id, error } => {
                    log::error!("Excluding vault {} from snapshot: {}", vault_id, error);
                    failures.push(VaultFailure {
                        vault_id,
                        reason: error.to_string(),
                    });
                }
            }
        }

        DashboardSnapshot {
            vaults,
            failures,
            stale,
            generated_at: self.clock.now(),
        }
    }

    async fn build_vault(&self, vault_id: &str, force_refresh: bool) -> VaultOutcome {
        let vault = match self
            .cached_vault(CacheKey::Vault(vault_id.to_string()), vault_id, force_refresh)
            .await
        {
            Ok(fetched) => fetched,
            Err(error) => {
                return VaultOutcome::Failed {
                    vault_id: vault_id.to_string(),
                    error,
                }
            }
        };

        // Market analytics are keyed by the vault's on-chain address. A
        // failure here degrades the vault instead of excluding it.
        let market_id = vault.value.contract_address.clone();
        let market = match self
            .cached_market(CacheKey::Market(market_id.clone()), &market_id, force_refresh)
            .await
        {
            Ok(fetched) => Some(fetched),
            Err(e) => {
                log::warn!(
                    "Market analytics unavailable for vault {} ({}): {}",
                    vault_id,
                    market_id,
                    e
                );
                None
            }
        };

        let served_stale = vault.freshness == Freshness::Stale
            || market
                .as_ref()
                .is_some_and(|m| m.freshness == Freshness::Stale);

        let status = if market.is_some() {
            DataStatus::Full
        } else {
            DataStatus::Partial
        };

        let record = vault.value;
        let snapshot = VaultSnapshot {
            allocations: merge_allocations(&record, market.as_ref().map(|m| &m.value)),
            id: record.id,
            chain_id: record.chain_id,
            chain_name: record.chain_name,
            protocol: record.protocol,
            name: record.friendly_name,
            tvl: record.tvl,
            base_apy: record.base_apy,
            reward_apr: record.reward_apr,
            status,
            fetched_at: self.clock.now(),
        };

        VaultOutcome::Ready {
            snapshot,
            served_stale,
        }
    }

    async fn cached_vault(
        &self,
        key: CacheKey,
        vault_id: &str,
        force_refresh: bool,
    ) -> Result<Fetched<VaultRecord>, DataError> {
        let fetch = || async {
            self.retry
                .run(|| self.vault_provider.fetch_vault(vault_id))
                .await
        };
        if force_refresh {
            self.vault_cache.refresh(key, fetch).await
        } else {
            self.vault_cache.get_or_fetch(key, fetch).await
        }
    }

    async fn cached_market(
        &self,
        key: CacheKey,
        market_id: &str,
        force_refresh: bool,
    ) -> Result<Fetched<MarketRecord>, DataError> {
        let fetch = || async {
            self.retry
                .run(|| self.market_provider.fetch_market(market_id))
                .await
        };
        if force_refresh {
            self.market_cache.refresh(key, fetch).await
        } else {
            self.market_cache.get_or_fetch(key, fetch).await
        }
    }
}

/// Joins the vault's allocation breakdown with per-market analytics by
/// collateral symbol.
///
/// When the vault record carries no breakdown of its own, weights are
/// derived from the markets' supply shares instead.
fn merge_allocations(vault: &VaultRecord, market: Option<&MarketRecord>) -> Vec<AssetAllocation> {
    use rust_decimal::Decimal;

    if vault.allocations.is_empty() {
        let Some(market) = market else {
            return vec![];
        };
        let total: Decimal = market.markets.iter().map(|m| m.supply_assets).sum();
        return market
            .markets
            .iter()
            .map(|m| AssetAllocation {
                asset: m.collateral_symbol.clone(),
                weight: if total > Decimal::ZERO {
                    m.supply_assets / total * Decimal::from(100)
                } else {
                    Decimal::ZERO
                },
                supply_apy: Some(m.supply_apy),
                reward_apr: Some(m.reward_apr),
                lltv: Some(m.lltv),
            })
            .collect();
    }

    vault
        .allocations
        .iter()
        .map(|alloc| {
            let matched = market.and_then(|m| {
                m.markets
                    .iter()
                    .find(|mkt| mkt.collateral_symbol == alloc.asset)
            });
            AssetAllocation {
                asset: alloc.asset.clone(),
                weight: alloc.weight,
                supply_apy: matched.map(|m| m.supply_apy),
                reward_apr: matched.map(|m| m.reward_apr),
                lltv: matched.map(|m| m.lltv),
            }
        })
        .collect()
}

/// Spawns a background task that force-refreshes the snapshot every
/// `period`, starting immediately. Dropping the handle does not stop the
/// task; abort it for shutdown.
pub fn spawn_refresh_task(service: Arc<SnapshotService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let snapshot = service.get_dashboard_snapshot(true).await;
            log::info!(
                "Background refresh complete: {} vaults, {} failures, stale={}",
                snapshot.vaults.len(),
                snapshot.failures.len(),
                snapshot.stale
            );
        }
    })
}
