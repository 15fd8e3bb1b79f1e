//! Morpho GraphQL provider.
//!
//! Resolves a protocol vault's lending-market breakdown from the Morpho Blue
//! API in two steps: look up the API-side vault id by on-chain address, then
//! query the vault's allocation state by that id.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::errors::DataError;
use crate::models::{MarketAllocation, MarketRecord};
use crate::provider::traits::MarketAnalyticsProvider;

pub const PROVIDER_ID: &str = "MORPHO";
const GRAPHQL_ENDPOINT: &str = "https://blue-api.morpho.org/graphql";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `lltv` arrives as a 1e18-scaled integer string; dividing by this yields
/// the fraction.
const WAD: u64 = 1_000_000_000_000_000_000;

/// Client for the Morpho Blue GraphQL API.
pub struct MorphoProvider {
    client: Client,
    endpoint: String,
}

impl MorphoProvider {
    pub fn new() -> Self {
        Self::with_endpoint(GRAPHQL_ENDPOINT.to_string())
    }

    /// Point the provider at a different endpoint, for tests.
    pub fn with_endpoint(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }

    async fn execute<T: DeserializeOwned>(&self, query: String) -> Result<T, DataError> {
        log::debug!("Executing GraphQL query against {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    DataError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::from_status(PROVIDER_ID, status, body));
        }

        let envelope: GraphQlResponse<T> =
            response.json().await.map_err(|e| DataError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        if let Some(errors) = envelope.errors {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(DataError::Parse {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        envelope.data.ok_or_else(|| DataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: "response carried neither data nor errors".to_string(),
        })
    }

    async fn lookup_vault_id(&self, address: &str) -> Result<String, DataError> {
        let query = format!(
            r#"query {{ vaults(where: {{ address_in: ["{}"] }}) {{ items {{ id address }} }} }}"#,
            address
        );
        let data: VaultLookupData = self.execute(query).await?;
        data.vaults
            .items
            .into_iter()
            .next()
            .map(|item| item.id)
            .ok_or_else(|| DataError::NotFound(address.to_string()))
    }

    async fn fetch_detail(&self, vault_id: &str) -> Result<VaultDetail, DataError> {
        let query = format!(
            r#"query {{ vault(id: "{}") {{ address state {{ allocation {{ market {{ collateralAsset {{ name symbol }} state {{ supplyApy rewards {{ supplyApr }} utilization }} lltv }} supplyAssets }} }} }} }}"#,
            vault_id
        );
        let data: VaultDetailData = self.execute(query).await?;
        Ok(data.vault)
    }
}

impl Default for MorphoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketAnalyticsProvider for MorphoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_market(&self, market_id: &str) -> Result<MarketRecord, DataError> {
        let vault_id = self.lookup_vault_id(market_id).await?;
        let detail = self.fetch_detail(&vault_id).await?;
        Ok(map_detail(detail))
    }
}

// Wire shapes.

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct VaultLookupData {
    vaults: VaultLookupItems,
}

#[derive(Debug, Deserialize)]
struct VaultLookupItems {
    items: Vec<VaultLookupItem>,
}

#[derive(Debug, Deserialize)]
struct VaultLookupItem {
    id: String,
    #[allow(dead_code)]
    address: String,
}

#[derive(Debug, Deserialize)]
struct VaultDetailData {
    vault: VaultDetail,
}

#[derive(Debug, Deserialize)]
struct VaultDetail {
    address: String,
    state: VaultState,
}

#[derive(Debug, Deserialize)]
struct VaultState {
    #[serde(default)]
    allocation: Vec<Allocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Allocation {
    market: Market,
    #[serde(default)]
    supply_assets: Option<ApiNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Market {
    /// Absent for the idle market, which holds unallocated liquidity.
    #[serde(default)]
    collateral_asset: Option<CollateralAsset>,
    #[serde(default)]
    state: Option<MarketState>,
    lltv: ApiNumber,
}

#[derive(Debug, Deserialize)]
struct CollateralAsset {
    name: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketState {
    #[serde(default)]
    supply_apy: Option<ApiNumber>,
    #[serde(default)]
    rewards: Vec<Reward>,
    #[serde(default)]
    utilization: Option<ApiNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reward {
    #[serde(default)]
    supply_apr: Option<ApiNumber>,
}

/// The API is inconsistent about numeric encoding: big integers arrive as
/// strings, rates as floats.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiNumber {
    S(String),
    F(f64),
}

impl ApiNumber {
    fn to_decimal(&self) -> Decimal {
        match self {
            ApiNumber::S(s) => s.parse().unwrap_or_default(),
            ApiNumber::F(f) => Decimal::from_f64(*f).unwrap_or_default(),
        }
    }
}

fn opt_decimal(value: &Option<ApiNumber>) -> Decimal {
    value.as_ref().map(ApiNumber::to_decimal).unwrap_or_default()
}

fn map_detail(detail: VaultDetail) -> MarketRecord {
    let markets = detail
        .state
        .allocation
        .into_iter()
        .filter_map(|alloc| {
            // Skip the idle market.
            let collateral = alloc.market.collateral_asset?;
            let state = alloc.market.state;

            let (supply_apy, reward_apr, utilization) = match &state {
                Some(s) => (
                    opt_decimal(&s.supply_apy),
                    s.rewards
                        .iter()
                        .map(|r| opt_decimal(&r.supply_apr))
                        .sum(),
                    s.utilization.as_ref().map(ApiNumber::to_decimal),
                ),
                None => (Decimal::ZERO, Decimal::ZERO, None),
            };

            Some(MarketAllocation {
                collateral_symbol: collateral.symbol,
                collateral_name: collateral.name,
                supply_assets: opt_decimal(&alloc.supply_assets),
                supply_apy,
                reward_apr,
                lltv: alloc.market.lltv.to_decimal() / Decimal::from(WAD),
                utilization,
            })
        })
        .collect();

    MarketRecord {
        vault_address: detail.address,
        markets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DETAIL_JSON: &str = r#"{
        "address": "0x3034dbbdd3d4e5ed6a0cd8fa4c6ecf9dd6dbd4e5",
        "state": {
            "allocation": [
                {
                    "market": {
                        "collateralAsset": {"name": "Wrapped liquid staked Ether", "symbol": "wstETH"},
                        "state": {
                            "supplyApy": 0.042,
                            "rewards": [{"supplyApr": 0.01}, {"supplyApr": 0.005}],
                            "utilization": 0.91
                        },
                        "lltv": "860000000000000000"
                    },
                    "supplyAssets": "1500000000000"
                },
                {
                    "market": {
                        "collateralAsset": null,
                        "state": null,
                        "lltv": "0"
                    },
                    "supplyAssets": "250000000000"
                }
            ]
        }
    }"#;

    #[test]
    fn test_detail_maps_to_market_record() {
        let detail: VaultDetail = serde_json::from_str(DETAIL_JSON).unwrap();
        let record = map_detail(detail);

        assert_eq!(
            record.vault_address,
            "0x3034dbbdd3d4e5ed6a0cd8fa4c6ecf9dd6dbd4e5"
        );
        // The idle market (no collateral asset) is dropped.
        assert_eq!(record.markets.len(), 1);

        let market = &record.markets[0];
        assert_eq!(market.collateral_symbol, "wstETH");
        assert_eq!(market.supply_apy, dec!(0.042));
        assert_eq!(market.supply_assets, dec!(1500000000000));
        assert_eq!(market.utilization, Some(dec!(0.91)));
    }

    #[test]
    fn test_reward_aprs_are_summed() {
        let detail: VaultDetail = serde_json::from_str(DETAIL_JSON).unwrap();
        let record = map_detail(detail);
        assert_eq!(record.markets[0].reward_apr, dec!(0.015));
    }

    #[test]
    fn test_lltv_is_descaled_from_wad() {
        let detail: VaultDetail = serde_json::from_str(DETAIL_JSON).unwrap();
        let record = map_detail(detail);
        assert_eq!(record.markets[0].lltv, dec!(0.86));
    }

    #[test]
    fn test_api_number_accepts_strings_and_floats() {
        let s: ApiNumber = serde_json::from_str(r#""860000000000000000""#).unwrap();
        assert_eq!(s.to_decimal(), dec!(860000000000000000));

        let f: ApiNumber = serde_json::from_str("0.042").unwrap();
        assert_eq!(f.to_decimal(), dec!(0.042));
    }

    #[test]
    fn test_graphql_errors_are_surfaced() {
        let json = r#"{"data": null, "errors": [{"message": "vault not found"}]}"#;
        let envelope: GraphQlResponse<VaultDetailData> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.unwrap()[0].message, "vault not found");
    }
}
