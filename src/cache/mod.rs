//! In-memory TTL cache with stale fallback.
//!
//! Entries never expire destructively: an entry past its TTL is refreshed on
//! the next read, and if that refresh fails the expired value is served as a
//! last resort. See [`CacheStore`].

mod store;

use std::fmt;

pub use store::{CacheStore, Clock, Fetched, SystemClock};

/// Key for a cached record.
///
/// The variants partition the key space so vault records and market records
/// can share key types without colliding.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CacheKey {
    /// The full vault directory listing.
    VaultDirectory,
    /// A single vault record, by vault id.
    Vault(String),
    /// Market analytics for one protocol vault, by contract address.
    Market(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::VaultDirectory => write!(f, "vault-directory"),
            CacheKey::Vault(id) => write!(f, "vault:{}", id),
            CacheKey::Market(id) => write!(f, "market:{}", id),
        }
    }
}

/// How a value returned by the cache relates to its TTL.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Freshness {
    /// Served from cache, within TTL. No upstream call was made.
    Hit,
    /// Fetched from the upstream on this call.
    Refreshed,
    /// Served from an expired entry because the refresh failed.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display() {
        assert_eq!(CacheKey::VaultDirectory.to_string(), "vault-directory");
        assert_eq!(
            CacheKey::Vault("vL7k".to_string()).to_string(),
            "vault:vL7k"
        );
        assert_eq!(
            CacheKey::Market("0xabc".to_string()).to_string(),
            "market:0xabc"
        );
    }
}
