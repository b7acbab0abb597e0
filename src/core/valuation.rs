//! Portfolio valuation against the rate table.

use crate::core::currency::CurrencyCode;
use crate::core::portfolio::Portfolio;
use crate::core::rates::{RateTable, round_money};
use tracing::debug;

/// One holding converted into the requested base currency. A failed
/// conversion is surfaced on the line rather than dropped, so callers can
/// decide between aborting and rendering a placeholder.
#[derive(Debug, Clone)]
pub struct ValuationLine {
    pub currency: CurrencyCode,
    pub amount: f64,
    pub converted: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Valuation {
    pub base: CurrencyCode,
    pub lines: Vec<ValuationLine>,
    /// Sum of the converted lines; `None` when any line failed to value.
    pub total: Option<f64>,
}

pub struct ValuationEngine<'a> {
    table: &'a RateTable,
}

impl<'a> ValuationEngine<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { table }
    }

    /// Values every non-zero holding in `base`. Each line is rounded to 2
    /// decimals for display; the total sums the rounded lines and is rounded
    /// last. The 8-digit internal rate precision is unaffected.
    pub fn valuate(&self, portfolio: &Portfolio, base: &CurrencyCode) -> Valuation {
        let mut lines = Vec::new();
        let mut total = 0.0;
        let mut complete = true;

        for (currency, amount) in portfolio.holdings() {
            match self.table.lookup(currency, base) {
                Ok(entry) => {
                    let converted = round_money(amount * entry.rate);
                    total += converted;
                    lines.push(ValuationLine {
                        currency: currency.clone(),
                        amount,
                        converted: Some(converted),
                        error: None,
                    });
                }
                Err(e) => {
                    debug!(currency = %currency, error = %e, "Holding could not be valued");
                    complete = false;
                    lines.push(ValuationLine {
                        currency: currency.clone(),
                        amount,
                        converted: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Valuation {
            base: base.clone(),
            lines,
            total: complete.then(|| round_money(total)),
        }
    }
}
