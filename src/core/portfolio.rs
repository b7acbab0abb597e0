//! User accounts, holdings and trade history.

use crate::core::currency::CurrencyCode;
use crate::core::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-currency balances. All balances are non-negative; an absent currency
/// is the same as a zero balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    balances: BTreeMap<CurrencyCode, f64>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a fresh portfolio with the starting balance in `currency`.
    pub fn seeded(currency: CurrencyCode, balance: f64) -> Self {
        let mut portfolio = Self::new();
        if balance > 0.0 {
            portfolio.balances.insert(currency, balance);
        }
        portfolio
    }

    pub fn balance(&self, currency: &CurrencyCode) -> f64 {
        self.balances.get(currency).copied().unwrap_or(0.0)
    }

    /// Holdings with a non-zero balance, in code order.
    pub fn holdings(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.balances
            .iter()
            .filter(|(_, balance)| **balance > 0.0)
            .map(|(code, balance)| (code, *balance))
    }

    pub fn credit(&mut self, currency: &CurrencyCode, amount: f64) -> Result<(), CoreError> {
        if amount <= 0.0 {
            return Err(CoreError::InvalidAmount(amount));
        }
        *self.balances.entry(currency.clone()).or_insert(0.0) += amount;
        Ok(())
    }

    pub fn debit(&mut self, currency: &CurrencyCode, amount: f64) -> Result<(), CoreError> {
        if amount <= 0.0 {
            return Err(CoreError::InvalidAmount(amount));
        }
        let available = self.balance(currency);
        if amount > available {
            return Err(CoreError::InsufficientHoldings {
                currency: currency.clone(),
                available,
                requested: amount,
            });
        }
        self.balances.insert(currency.clone(), available - amount);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "BUY"),
            TradeDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// Immutable record of one executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: uuid::Uuid,
    pub currency: CurrencyCode,
    pub amount: f64,
    pub direction: TradeDirection,
    /// Price of one unit in the settlement currency at execution time.
    pub unit_rate: f64,
    /// Settlement-side value: cost for buys, proceeds for sells.
    pub counter_value: f64,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub registered_at: DateTime<Utc>,
    pub portfolio: Portfolio,
    #[serde(default)]
    pub trades: Vec<Trade>,
}
