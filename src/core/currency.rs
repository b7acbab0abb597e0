//! Currency identifiers and the registry of supported currencies.

use crate::core::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A normalized currency code: 2-5 ASCII letters, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        if !(2..=5).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::UnknownCurrency(s.to_string()));
        }
        Ok(CurrencyCode(code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CurrencyKind {
    Fiat { issuing_country: String },
    Crypto { algorithm: String, market_cap: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub name: String,
    pub kind: CurrencyKind,
}

impl Currency {
    fn fiat(code: &str, name: &str, country: &str) -> Self {
        Self {
            code: code.parse().expect("static code"),
            name: name.to_string(),
            kind: CurrencyKind::Fiat {
                issuing_country: country.to_string(),
            },
        }
    }

    fn crypto(code: &str, name: &str, algorithm: &str, market_cap: f64) -> Self {
        Self {
            code: code.parse().expect("static code"),
            name: name.to_string(),
            kind: CurrencyKind::Crypto {
                algorithm: algorithm.to_string(),
                market_cap,
            },
        }
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self.kind, CurrencyKind::Crypto { .. })
    }

    /// One-line description used by the CLI.
    pub fn display_info(&self) -> String {
        match &self.kind {
            CurrencyKind::Fiat { issuing_country } => {
                format!(
                    "[FIAT] {} - {} (issuing: {})",
                    self.code, self.name, issuing_country
                )
            }
            CurrencyKind::Crypto {
                algorithm,
                market_cap,
            } => {
                let mcap = if *market_cap > 1e6 {
                    format!("{market_cap:.2e}")
                } else {
                    format!("{market_cap:.2}")
                };
                format!(
                    "[CRYPTO] {} - {} (algo: {}, mcap: {})",
                    self.code, self.name, algorithm, mcap
                )
            }
        }
    }
}

/// The set of currencies the application knows how to describe and trade.
pub struct CurrencyRegistry {
    currencies: Vec<Currency>,
}

impl CurrencyRegistry {
    pub fn new() -> Self {
        Self {
            currencies: vec![
                Currency::fiat("USD", "US Dollar", "United States"),
                Currency::fiat("EUR", "Euro", "Eurozone"),
                Currency::fiat("GBP", "British Pound", "United Kingdom"),
                Currency::fiat("RUB", "Russian Ruble", "Russia"),
                Currency::crypto("BTC", "Bitcoin", "SHA-256", 1.12e12),
                Currency::crypto("ETH", "Ethereum", "Ethash", 4.5e11),
                Currency::crypto("SOL", "Solana", "Proof of History", 6.7e10),
            ],
        }
    }

    /// Parses and validates a code against the registry.
    pub fn resolve(&self, code: &str) -> Result<&Currency, CoreError> {
        let code: CurrencyCode = code.parse()?;
        self.currencies
            .iter()
            .find(|c| c.code == code)
            .ok_or_else(|| CoreError::UnknownCurrency(code.to_string()))
    }

    pub fn all(&self) -> &[Currency] {
        &self.currencies
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalization() {
        let code: CurrencyCode = " btc ".parse().unwrap();
        assert_eq!(code.as_str(), "BTC");
        assert_eq!(code, "BTC".parse().unwrap());
    }

    #[test]
    fn test_code_shape_rejected() {
        assert!("B".parse::<CurrencyCode>().is_err());
        assert!("TOOLONG".parse::<CurrencyCode>().is_err());
        assert!("US1".parse::<CurrencyCode>().is_err());
        assert!("".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_registry_resolve() {
        let registry = CurrencyRegistry::new();
        let btc = registry.resolve("btc").unwrap();
        assert!(btc.is_crypto());
        assert!(btc.display_info().contains("SHA-256"));

        let usd = registry.resolve("USD").unwrap();
        assert!(!usd.is_crypto());

        assert!(matches!(
            registry.resolve("XYZ"),
            Err(CoreError::UnknownCurrency(_))
        ));
    }
}
