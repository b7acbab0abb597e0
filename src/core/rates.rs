//! The canonical exchange-rate table: storage, lookup and derivation.
//!
//! Rates are stored per ordered pair under a `"BASE_QUOTE"` key, one entry
//! per pair, last write wins. Inverse and one-hop cross rates are computed
//! views over the stored entries and are never persisted themselves.

use crate::core::currency::CurrencyCode;
use crate::core::error::CoreError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source label attached to inverse and cross-derived entries.
pub const DERIVED_SOURCE: &str = "derived";

/// Fixed internal precision for rate arithmetic (fractional digits).
const RATE_SCALE: f64 = 1e8;

/// Rounds a rate to the fixed internal precision. Applied after every
/// derivation step so inversion and cross-multiplication do not accumulate
/// float noise.
pub fn round_rate(rate: f64) -> f64 {
    (rate * RATE_SCALE).round() / RATE_SCALE
}

/// Rounds a monetary value to 2 decimals for display and settlement.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

impl RateEntry {
    /// Advisory staleness check; callers decide whether to warn or reject.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        Utc::now() - self.updated_at > max_age
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.updated_at
    }
}

fn default_anchor() -> CurrencyCode {
    "USD".parse().expect("static code")
}

/// Mapping from ordered currency pair to its latest known rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    pairs: BTreeMap<String, RateEntry>,
    pub last_refresh: Option<DateTime<Utc>>,
    /// Pivot for one-hop cross derivation and trade settlement.
    #[serde(default = "default_anchor")]
    anchor: CurrencyCode,
}

fn pair_key(base: &CurrencyCode, quote: &CurrencyCode) -> String {
    format!("{base}_{quote}")
}

impl RateTable {
    pub fn new(anchor: CurrencyCode) -> Self {
        Self {
            pairs: BTreeMap::new(),
            last_refresh: None,
            anchor,
        }
    }

    pub fn anchor(&self) -> &CurrencyCode {
        &self.anchor
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Stored entries in key order. Derived pairs do not appear here.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &RateEntry)> {
        self.pairs.iter()
    }

    /// Inserts or replaces the entry for the exact ordered pair.
    pub fn upsert(
        &mut self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        rate: f64,
        updated_at: DateTime<Utc>,
        source: &str,
    ) -> Result<(), CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::InvalidRate {
                pair: pair_key(base, quote),
                rate,
            });
        }
        self.pairs.insert(
            pair_key(base, quote),
            RateEntry {
                rate: round_rate(rate),
                updated_at,
                source: source.to_string(),
            },
        );
        Ok(())
    }

    /// Resolves a rate for `base -> quote`.
    ///
    /// Order of attempts: identity, direct entry, inverse entry, one-hop
    /// cross via the anchor. Exactly one hop is tried; longer chains would
    /// compound rounding error for no observed upstream need.
    pub fn lookup(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> Result<RateEntry, CoreError> {
        if base == quote {
            return Ok(RateEntry {
                rate: 1.0,
                updated_at: Utc::now(),
                source: "identity".to_string(),
            });
        }

        if let Some(entry) = self.pairs.get(&pair_key(base, quote)) {
            return Ok(entry.clone());
        }

        if let Some(inverse) = self.pairs.get(&pair_key(quote, base)) {
            return Ok(RateEntry {
                rate: round_rate(1.0 / inverse.rate),
                updated_at: inverse.updated_at,
                source: DERIVED_SOURCE.to_string(),
            });
        }

        // One-hop cross: base -> anchor -> quote, each leg direct or inverse.
        if let (Some((to_anchor, ts_a)), Some((from_anchor, ts_b))) = (
            self.leg(base, &self.anchor),
            self.leg(&self.anchor, quote),
        ) {
            return Ok(RateEntry {
                rate: round_rate(to_anchor * from_anchor),
                // The staler leg bounds how fresh the derived rate can claim to be.
                updated_at: ts_a.min(ts_b),
                source: DERIVED_SOURCE.to_string(),
            });
        }

        Err(CoreError::RateNotFound {
            base: base.clone(),
            quote: quote.clone(),
        })
    }

    /// One conversion leg `from -> to` from a stored entry or its inverse.
    fn leg(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<(f64, DateTime<Utc>)> {
        if let Some(entry) = self.pairs.get(&pair_key(from, to)) {
            return Some((entry.rate, entry.updated_at));
        }
        self.pairs
            .get(&pair_key(to, from))
            .map(|entry| (round_rate(1.0 / entry.rate), entry.updated_at))
    }
}
