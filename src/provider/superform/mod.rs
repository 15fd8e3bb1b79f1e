//! Superform REST provider.
//!
//! Serves vault identity and statistics from the Superform API. Every
//! request is authenticated with an `SF-API-KEY` header.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::DataError;
use crate::models::{VaultAllocation, VaultRecord};
use crate::provider::traits::VaultDataProvider;

pub const PROVIDER_ID: &str = "SUPERFORM";
const BASE_URL: &str = "https://api.superform.xyz";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Superform vault API.
pub struct SuperformProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SuperformProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    /// Point the provider at a different base URL, for tests and staging.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            base_url,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DataError> {
        if self.api_key.is_empty() {
            return Err(DataError::MissingApiKey);
        }

        let url = format!("{}/{}", self.base_url, path);
        log::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("SF-API-KEY", &self.api_key)
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

        response.json::<T>().await.map_err(|e| DataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl VaultDataProvider for SuperformProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_vault(&self, vault_id: &str) -> Result<VaultRecord, DataError> {
        let raw: RawVault = self.get_json(&format!("vault/{}", vault_id)).await?;
        Ok(raw.into_record())
    }

    async fn fetch_vaults(&self) -> Result<Vec<VaultRecord>, DataError> {
        let raw: Vec<RawSupervault> = self.get_json("stats/vault/supervaults").await?;
        Ok(raw.into_iter().map(|s| s.vault.into_record()).collect())
    }
}

// Wire shapes. Statistics fields arrive as floats; they are converted to
// Decimal once, at the edge.

#[derive(Debug, Deserialize)]
struct RawSupervault {
    vault: RawVault,
}

#[derive(Debug, Deserialize)]
struct RawVault {
    id: String,
    friendly_name: String,
    contract_address: String,
    chain: RawChain,
    #[serde(default)]
    protocol: Option<RawProtocol>,
    #[serde(default)]
    vault_statistics: RawVaultStatistics,
    #[serde(default)]
    yield_type: Option<String>,
    #[serde(default)]
    allocations: Vec<RawAllocation>,
    #[serde(default)]
    external_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChain {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawProtocol {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVaultStatistics {
    #[serde(default)]
    tvl_now: Option<f64>,
    #[serde(default)]
    apy_now: Option<f64>,
    #[serde(default)]
    reward_apr_now: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAllocation {
    asset: String,
    #[serde(default)]
    weight: Option<f64>,
}

fn decimal_from(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64).unwrap_or_default()
}

impl RawVault {
    fn into_record(self) -> VaultRecord {
        VaultRecord {
            id: self.id,
            chain_id: self.chain.id,
            chain_name: self.chain.name,
            contract_address: self.contract_address,
            protocol: self
                .protocol
                .and_then(|p| p.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            friendly_name: self.friendly_name,
            yield_type: self.yield_type,
            tvl: decimal_from(self.vault_statistics.tvl_now),
            base_apy: decimal_from(self.vault_statistics.apy_now),
            reward_apr: decimal_from(self.vault_statistics.reward_apr_now),
            allocations: self
                .allocations
                .into_iter()
                .map(|a| VaultAllocation {
                    asset: a.asset,
                    weight: decimal_from(a.weight),
                })
                .collect(),
            external_url: self.external_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const VAULT_JSON: &str = r#"{
        "id": "vL7k-5ZgYCoFgi6kz2jIJ",
        "friendly_name": "SuperUSDC",
        "contract_address": "0x3034dbbdd3d4e5ed6a0cd8fa4c6ecf9dd6dbd4e5",
        "chain": {"id": 8453, "name": "Base"},
        "protocol": {"name": "Morpho"},
        "vault_statistics": {"tvl_now": 12500000.5, "apy_now": 6.42, "reward_apr_now": 1.08},
        "yield_type": "Lending",
        "external_url": "https://www.superform.xyz/vault/vL7k-5ZgYCoFgi6kz2jIJ/"
    }"#;

    #[test]
    fn test_vault_response_maps_to_record() {
        let raw: RawVault = serde_json::from_str(VAULT_JSON).unwrap();
        let record = raw.into_record();

        assert_eq!(record.id, "vL7k-5ZgYCoFgi6kz2jIJ");
        assert_eq!(record.chain_id, 8453);
        assert_eq!(record.chain_name, "Base");
        assert_eq!(record.protocol, "Morpho");
        assert_eq!(record.tvl, dec!(12500000.5));
        assert_eq!(record.base_apy, dec!(6.42));
        assert_eq!(record.reward_apr, dec!(1.08));
        assert_eq!(record.yield_type.as_deref(), Some("Lending"));
        assert!(record.allocations.is_empty());
    }

    #[test]
    fn test_missing_statistics_default_to_zero() {
        let json = r#"{
            "id": "vault-2",
            "friendly_name": "SuperETH",
            "contract_address": "0xabc",
            "chain": {"id": 1, "name": "Ethereum"}
        }"#;
        let raw: RawVault = serde_json::from_str(json).unwrap();
        let record = raw.into_record();

        assert_eq!(record.tvl, Decimal::ZERO);
        assert_eq!(record.base_apy, Decimal::ZERO);
        assert_eq!(record.protocol, "Unknown");
    }

    #[test]
    fn test_directory_response_unwraps_vault_objects() {
        let json = format!(r#"[{{"vault": {}}}]"#, VAULT_JSON);
        let raw: Vec<RawSupervault> = serde_json::from_str(&json).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].vault.id, "vL7k-5ZgYCoFgi6kz2jIJ");
    }
}
