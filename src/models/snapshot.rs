use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{ChainId, VaultId};

/// Completeness of a single vault's snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataStatus {
    /// Both the vault record and its market analytics were available.
    Full,
    /// The vault record was available but the market analytics were not.
    /// Market-derived fields on the allocations are `None`.
    Partial,
}

/// One asset within a vault's merged allocation breakdown.
///
/// `weight` comes from the vault record; the market-derived fields are
/// populated when the analytics lookup succeeded and the asset matched a
/// lending market by collateral symbol.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocation {
    pub asset: String,
    /// Share of the vault's capital, as a percentage (0-100).
    pub weight: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_apy: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_apr: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lltv: Option<Decimal>,
}

/// Fully assembled view of one vault, ready for the dashboard.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    pub id: VaultId,
    pub chain_id: ChainId,
    pub chain_name: String,
    pub protocol: String,
    pub name: String,
    pub tvl: Decimal,
    pub base_apy: Decimal,
    pub reward_apr: Decimal,
    pub allocations: Vec<AssetAllocation>,
    pub status: DataStatus,
    pub fetched_at: DateTime<Utc>,
}

/// A vault that could not be included in the snapshot at all.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultFailure {
    pub vault_id: VaultId,
    pub reason: String,
}

/// The aggregate result of one dashboard refresh.
///
/// Vaults whose primary record could not be fetched are excluded from
/// `vaults` and recorded in `failures` instead; the snapshot itself is
/// always produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub vaults: HashMap<VaultId, VaultSnapshot>,
    pub failures: Vec<VaultFailure>,
    /// True when at least one vault was served from an expired cache entry
    /// because its refresh failed.
    pub stale: bool,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// True when any vault is missing or degraded.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
            || self
                .vaults
                .values()
                .any(|v| v.status == DataStatus::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(status: DataStatus) -> VaultSnapshot {
        VaultSnapshot {
            id: "vault-1".to_string(),
            chain_id: 1,
            chain_name: "Ethereum".to_string(),
            protocol: "Morpho".to_string(),
            name: "SuperUSDC".to_string(),
            tvl: dec!(1000000),
            base_apy: dec!(5.0),
            reward_apr: dec!(0.5),
            allocations: vec![],
            status,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_snapshot_is_not_partial() {
        let dashboard = DashboardSnapshot {
            vaults: HashMap::from([("vault-1".to_string(), snapshot(DataStatus::Full))]),
            failures: vec![],
            stale: false,
            generated_at: Utc::now(),
        };
        assert!(!dashboard.is_partial());
    }

    #[test]
    fn test_degraded_vault_makes_snapshot_partial() {
        let dashboard = DashboardSnapshot {
            vaults: HashMap::from([("vault-1".to_string(), snapshot(DataStatus::Partial))]),
            failures: vec![],
            stale: false,
            generated_at: Utc::now(),
        };
        assert!(dashboard.is_partial());
    }

    #[test]
    fn test_excluded_vault_makes_snapshot_partial() {
        let dashboard = DashboardSnapshot {
            vaults: HashMap::new(),
            failures: vec![VaultFailure {
                vault_id: "vault-1".to_string(),
                reason: "Timeout: SUPERFORM".to_string(),
            }],
            stale: false,
            generated_at: Utc::now(),
        };
        assert!(dashboard.is_partial());
    }
}
