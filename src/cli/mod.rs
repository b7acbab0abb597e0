//! Terminal presentation for the CLI commands.

pub mod portfolio;
pub mod rates;
pub mod trade;
pub mod ui;

use crate::core::currency::CurrencyCode;

/// Formats an amount for display: crypto balances keep 8 digits, fiat 2.
pub fn format_amount(currency: &CurrencyCode, amount: f64, is_crypto: bool) -> String {
    if is_crypto {
        format!("{amount:.8} {currency}")
    } else {
        format!("{amount:.2} {currency}")
    }
}
