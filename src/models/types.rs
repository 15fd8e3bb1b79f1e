/// Vault identifier as assigned by the vault-aggregation API.
pub type VaultId = String;

/// Market identifier - the on-chain address of the protocol vault whose
/// lending markets are queried from the analytics endpoint.
pub type MarketId = String;

/// EVM chain identifier (1 = Ethereum mainnet, 8453 = Base, ...).
pub type ChainId = u64;
