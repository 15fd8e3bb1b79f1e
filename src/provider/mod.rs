//! Upstream data providers.
//!
//! Each provider wraps one external API behind a trait so the aggregation
//! layer can be exercised against stubs:
//! - [`SuperformProvider`]: vault identity and statistics (REST)
//! - [`MorphoProvider`]: per-market lending analytics (GraphQL)

pub mod morpho;
pub mod superform;
mod traits;

pub use morpho::MorphoProvider;
pub use superform::SuperformProvider;
pub use traits::{MarketAnalyticsProvider, VaultDataProvider};
