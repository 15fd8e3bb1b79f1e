use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{ChainId, VaultId};

/// Raw per-vault record as returned by the vault-aggregation API.
///
/// Replaced wholesale on each refresh; the cache hands out clones, never
/// references into its own storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub id: VaultId,
    pub chain_id: ChainId,
    pub chain_name: String,

    /// On-chain address of the underlying protocol vault. Also the key used
    /// for the market-analytics lookup.
    pub contract_address: String,

    pub protocol: String,
    pub friendly_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_type: Option<String>,

    /// Total value locked, in USD.
    pub tvl: Decimal,

    /// Organic yield rate, as a percentage.
    pub base_apy: Decimal,

    /// Incentive-driven yield rate, as a percentage.
    pub reward_apr: Decimal,

    /// Capital distribution across underlying assets, as reported by the
    /// vault API. May be empty when the API carries no breakdown.
    pub allocations: Vec<VaultAllocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

/// One slice of a vault's capital distribution.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultAllocation {
    pub asset: String,
    /// Share of the vault's capital, as a percentage (0-100).
    pub weight: Decimal,
}

/// Raw analytics record for one protocol vault, from the lending-market
/// GraphQL endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    /// Address of the protocol vault the markets belong to.
    pub vault_address: String,
    pub markets: Vec<MarketAllocation>,
}

/// Per-collateral lending-market state within a protocol vault.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAllocation {
    pub collateral_symbol: String,
    pub collateral_name: String,

    /// Assets supplied to this market, in the vault's underlying token.
    pub supply_assets: Decimal,

    /// Organic supply APY, as a percentage.
    pub supply_apy: Decimal,

    /// Sum of incentive APRs, as a percentage.
    pub reward_apr: Decimal,

    /// Liquidation loan-to-value, as a fraction (0-1).
    pub lltv: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<Decimal>,
}

impl MarketAllocation {
    /// Combined organic and incentive yield, as a percentage.
    pub fn total_apy(&self) -> Decimal {
        self.supply_apy + self.reward_apr
    }
}
