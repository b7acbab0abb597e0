//! Trade execution: validate, price, check funds, apply.

use crate::core::currency::{CurrencyCode, CurrencyRegistry};
use crate::core::error::CoreError;
use crate::core::portfolio::{Trade, TradeDirection, User};
use crate::core::rates::{RateTable, round_money};
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

/// Result of an applied trade, with the balances it left behind.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub trade: Trade,
    pub settlement_balance: f64,
    pub currency_balance: f64,
}

/// Executes buys and sells against a user's portfolio, priced from the rate
/// table in its anchor (settlement) currency.
///
/// Every precondition is checked before the first balance mutation, so an
/// error never leaves the portfolio half-updated. The caller persists the
/// user once, after the trade is fully applied.
pub struct TradeExecutor<'a> {
    table: &'a RateTable,
    registry: &'a CurrencyRegistry,
    /// When set, trades are rejected if the priced entry is older than this.
    max_rate_age: Option<Duration>,
}

impl<'a> TradeExecutor<'a> {
    pub fn new(
        table: &'a RateTable,
        registry: &'a CurrencyRegistry,
        max_rate_age: Option<Duration>,
    ) -> Self {
        Self {
            table,
            registry,
            max_rate_age,
        }
    }

    pub fn buy(
        &self,
        user: &mut User,
        currency: &CurrencyCode,
        amount: f64,
    ) -> Result<TradeOutcome, CoreError> {
        let (entry, anchor) = self.price(currency, amount)?;
        let cost = round_money(amount * entry.rate);
        if cost <= 0.0 {
            // Rounds to nothing in the settlement currency; not a real trade.
            return Err(CoreError::InvalidAmount(amount));
        }

        let available = user.portfolio.balance(&anchor);
        if available < cost {
            return Err(CoreError::InsufficientFunds {
                currency: anchor,
                available,
                required: cost,
            });
        }

        user.portfolio.debit(&anchor, cost)?;
        user.portfolio.credit(currency, amount)?;
        let trade = self.record(user, currency, amount, TradeDirection::Buy, entry.rate, cost);

        info!(
            user = %user.username,
            currency = %currency,
            amount,
            cost,
            rate = entry.rate,
            "Buy executed"
        );
        Ok(TradeOutcome {
            settlement_balance: user.portfolio.balance(self.table.anchor()),
            currency_balance: user.portfolio.balance(currency),
            trade,
        })
    }

    pub fn sell(
        &self,
        user: &mut User,
        currency: &CurrencyCode,
        amount: f64,
    ) -> Result<TradeOutcome, CoreError> {
        let (entry, anchor) = self.price(currency, amount)?;
        let proceeds = round_money(amount * entry.rate);
        if proceeds <= 0.0 {
            return Err(CoreError::InvalidAmount(amount));
        }

        let available = user.portfolio.balance(currency);
        if amount > available {
            return Err(CoreError::InsufficientHoldings {
                currency: currency.clone(),
                available,
                requested: amount,
            });
        }

        user.portfolio.debit(currency, amount)?;
        user.portfolio.credit(&anchor, proceeds)?;
        let trade = self.record(
            user,
            currency,
            amount,
            TradeDirection::Sell,
            entry.rate,
            proceeds,
        );

        info!(
            user = %user.username,
            currency = %currency,
            amount,
            proceeds,
            rate = entry.rate,
            "Sell executed"
        );
        Ok(TradeOutcome {
            settlement_balance: user.portfolio.balance(self.table.anchor()),
            currency_balance: user.portfolio.balance(currency),
            trade,
        })
    }

    /// Shared validation and pricing: amount shape, registry membership,
    /// rate lookup against the anchor, freshness policy.
    fn price(
        &self,
        currency: &CurrencyCode,
        amount: f64,
    ) -> Result<(crate::core::rates::RateEntry, CurrencyCode), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidAmount(amount));
        }
        self.registry.resolve(currency.as_str())?;

        let anchor = self.table.anchor().clone();
        let entry = self.table.lookup(currency, &anchor)?;

        if let Some(max_age) = self.max_rate_age {
            if entry.is_stale(max_age) {
                return Err(CoreError::StaleRate {
                    pair: format!("{currency}_{anchor}"),
                    age_secs: entry.age().num_seconds(),
                    max_secs: max_age.num_seconds(),
                });
            }
        }
        Ok((entry, anchor))
    }

    fn record(
        &self,
        user: &mut User,
        currency: &CurrencyCode,
        amount: f64,
        direction: TradeDirection,
        unit_rate: f64,
        counter_value: f64,
    ) -> Trade {
        let trade = Trade {
            id: Uuid::new_v4(),
            currency: currency.clone(),
            amount,
            direction,
            unit_rate,
            counter_value,
            executed_at: Utc::now(),
        };
        user.trades.push(trade.clone());
        trade
    }
}
