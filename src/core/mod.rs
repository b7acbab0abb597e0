//! Core domain: currencies, the rate table, portfolios and trading.

pub mod currency;
pub mod error;
pub mod portfolio;
pub mod rates;
pub mod trade;
pub mod valuation;

pub use currency::{Currency, CurrencyCode, CurrencyRegistry};
pub use error::CoreError;
pub use portfolio::{Portfolio, Trade, TradeDirection, User};
pub use rates::{RateEntry, RateTable};
