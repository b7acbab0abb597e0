use crate::cli::{format_amount, ui};
use crate::core::currency::{CurrencyCode, CurrencyRegistry};
use crate::core::portfolio::TradeDirection;
use crate::core::trade::TradeOutcome;

/// Renders one executed trade with the balances it left behind.
pub fn render(
    outcome: &TradeOutcome,
    anchor: &CurrencyCode,
    registry: &CurrencyRegistry,
) -> String {
    let trade = &outcome.trade;
    let is_crypto = registry
        .resolve(trade.currency.as_str())
        .map(|c| c.is_crypto())
        .unwrap_or(false);

    let action = match trade.direction {
        TradeDirection::Buy => format!(
            "Bought {} for {:.2} {}",
            format_amount(&trade.currency, trade.amount, is_crypto),
            trade.counter_value,
            anchor
        ),
        TradeDirection::Sell => format!(
            "Sold {} for {:.2} {}",
            format_amount(&trade.currency, trade.amount, is_crypto),
            trade.counter_value,
            anchor
        ),
    };

    format!(
        "{}\nRate: 1 {} = {} {}\nBalances: {} | {}",
        ui::style_text(&action, ui::StyleType::TotalValue),
        trade.currency,
        trade.unit_rate,
        anchor,
        format_amount(anchor, outcome.settlement_balance, false),
        format_amount(&trade.currency, outcome.currency_balance, is_crypto),
    )
}
