//! Upstream quote sources.
//!
//! Each provider adapter exposes the same `QuoteSource` surface: a fetch
//! that either yields provider-native quotes or one fetch error. All
//! normalization (code casing, validation, rounding) happens in the
//! refresher, never here.

pub mod coingecko;
pub mod exchangerate;
pub mod util;

use crate::core::error::CoreError;
use async_trait::async_trait;

/// One upstream-reported exchange rate, in provider-native shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub base: String,
    pub quote: String,
    pub rate: f64,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Stable identifier recorded as the `source` of every written rate.
    fn id(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<RawQuote>, CoreError>;
}
