//! CoinGecko adapter: crypto spot prices quoted in the anchor currency.

use super::util::with_retry;
use crate::core::error::CoreError;
use crate::providers::{QuoteSource, RawQuote};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::error;

const SOURCE_ID: &str = "CoinGecko";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Maps a tracked currency code to its CoinGecko coin id, e.g. BTC -> bitcoin.
#[derive(Debug, Clone)]
pub struct CoinId {
    pub code: String,
    pub id: String,
}

/// Built-in coin id mapping for the commonly tracked cryptos.
pub fn default_coin_id(code: &str) -> Option<&'static str> {
    match code.to_uppercase().as_str() {
        "BTC" => Some("bitcoin"),
        "ETH" => Some("ethereum"),
        "SOL" => Some("solana"),
        "LTC" => Some("litecoin"),
        "DOGE" => Some("dogecoin"),
        "ADA" => Some("cardano"),
        "DOT" => Some("polkadot"),
        "XRP" => Some("ripple"),
        "USDT" => Some("tether"),
        "USDC" => Some("usd-coin"),
        _ => None,
    }
}

pub struct CoinGeckoSource {
    base_url: String,
    client: reqwest::Client,
    vs_currency: String,
    coins: Vec<CoinId>,
}

impl CoinGeckoSource {
    pub fn new(base_url: &str, vs_currency: &str, coins: Vec<CoinId>) -> Self {
        Self {
            base_url: base_url.to_string(),
            client: reqwest::Client::new(),
            vs_currency: vs_currency.to_lowercase(),
            coins,
        }
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoSource {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<RawQuote>, CoreError> {
        if self.coins.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self
            .coins
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/api/v3/simple/price", self.base_url);

        let response = with_retry(
            || {
                self.client
                    .get(&url)
                    .query(&[("ids", ids.as_str()), ("vs_currencies", &self.vs_currency)])
                    .timeout(REQUEST_TIMEOUT)
                    .send()
            },
            3,
            Duration::from_millis(500),
        )
        .await
        .map_err(|e| CoreError::Fetch(format!("CoinGecko request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Fetch(format!(
                "CoinGecko API error: {}",
                response.status()
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| CoreError::Fetch(format!("CoinGecko response read failed: {e}")))?;

        // {"bitcoin": {"usd": 59337.21}, ...}
        let prices: HashMap<String, HashMap<String, f64>> =
            match serde_json::from_str(&response_text) {
                Ok(data) => data,
                Err(e) => {
                    error!(
                        error = ?e,
                        response = %response_text,
                        "Failed to parse CoinGecko response"
                    );
                    return Err(CoreError::Fetch(format!("CoinGecko malformed payload: {e}")));
                }
            };

        let quotes = self
            .coins
            .iter()
            .filter_map(|coin| {
                let rate = prices.get(&coin.id)?.get(&self.vs_currency)?;
                Some(RawQuote {
                    base: coin.code.clone(),
                    quote: self.vs_currency.clone(),
                    rate: *rate,
                })
            })
            .collect();
        Ok(quotes)
    }
}
