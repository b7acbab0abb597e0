//! Application configuration, loaded from a YAML file.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateConfig {
    pub base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

fn default_api_key() -> String {
    std::env::var("EXCHANGERATE_API_KEY").unwrap_or_else(|_| "demo-key".to_string())
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoConfig>,
    pub exchangerate: Option<ExchangeRateConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoConfig {
                base_url: "https://api.coingecko.com".to_string(),
            }),
            exchangerate: Some(ExchangeRateConfig {
                base_url: "https://v6.exchangerate-api.com".to_string(),
                api_key: default_api_key(),
            }),
        }
    }
}

fn default_anchor() -> String {
    "USD".to_string()
}

fn default_starting_balance() -> f64 {
    1000.0
}

fn default_fiats() -> Vec<String> {
    ["EUR", "GBP", "RUB"].map(str::to_string).to_vec()
}

fn default_cryptos() -> Vec<String> {
    ["BTC", "ETH", "SOL"].map(str::to_string).to_vec()
}

fn default_rates_ttl() -> i64 {
    5
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Settlement currency and pivot for cross-rate derivation.
    #[serde(default = "default_anchor")]
    pub anchor_currency: String,
    /// Anchor-currency balance seeded into new portfolios.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_fiats")]
    pub fiat_currencies: Vec<String>,
    #[serde(default = "default_cryptos")]
    pub crypto_currencies: Vec<String>,
    /// Advisory freshness window; older rates are flagged in the CLI.
    #[serde(default = "default_rates_ttl")]
    pub rates_ttl_minutes: i64,
    /// When set, trades against rates older than this are rejected.
    pub trade_max_age_minutes: Option<i64>,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // serde defaults double as the programmatic defaults.
        serde_yaml::from_str("{}").expect("empty config deserializes")
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "valuta", "valuta")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "valuta", "valuta")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
