//! Error taxonomy for the rate cache and trading core.

use crate::core::currency::CurrencyCode;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid rate {rate} for pair {pair}: rates must be positive")]
    InvalidRate { pair: String, rate: f64 },

    #[error("no exchange rate available for {base}/{quote}")]
    RateNotFound {
        base: CurrencyCode,
        quote: CurrencyCode,
    },

    #[error("unknown currency '{0}'")]
    UnknownCurrency(String),

    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error(
        "insufficient funds: available {available:.2} {currency}, required {required:.2} {currency}"
    )]
    InsufficientFunds {
        currency: CurrencyCode,
        available: f64,
        required: f64,
    },

    #[error("insufficient holdings: available {available} {currency}, requested {requested}")]
    InsufficientHoldings {
        currency: CurrencyCode,
        available: f64,
        requested: f64,
    },

    #[error("rate for {pair} is stale ({age_secs}s old, max {max_secs}s)")]
    StaleRate {
        pair: String,
        age_secs: i64,
        max_secs: i64,
    },

    #[error("upstream fetch failed: {0}")]
    Fetch(String),

    #[error("username cannot be empty")]
    InvalidUsername,

    #[error("username '{0}' is already taken")]
    UserExists(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("invalid password")]
    InvalidPassword,

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("not logged in; run `login` first")]
    NotLoggedIn,

    #[error(transparent)]
    Store(#[from] StoreError),
}
