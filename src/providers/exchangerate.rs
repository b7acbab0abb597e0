//! ExchangeRate-API adapter: fiat rates quoted from the anchor currency.

use super::util::with_retry;
use crate::core::error::CoreError;
use crate::providers::{QuoteSource, RawQuote};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::error;

const SOURCE_ID: &str = "ExchangeRate-API";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

pub struct ExchangeRateSource {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    base_currency: String,
    fiats: Vec<String>,
}

impl ExchangeRateSource {
    pub fn new(base_url: &str, api_key: &str, base_currency: &str, fiats: Vec<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
            base_currency: base_currency.to_uppercase(),
            fiats,
        }
    }
}

#[async_trait]
impl QuoteSource for ExchangeRateSource {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<RawQuote>, CoreError> {
        let url = format!(
            "{}/v6/{}/latest/{}",
            self.base_url, self.api_key, self.base_currency
        );

        let response = with_retry(
            || self.client.get(&url).timeout(REQUEST_TIMEOUT).send(),
            3,
            Duration::from_millis(500),
        )
        .await
        .map_err(|e| CoreError::Fetch(format!("ExchangeRate-API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Fetch(format!(
                "ExchangeRate-API error: {}",
                response.status()
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| CoreError::Fetch(format!("ExchangeRate-API response read failed: {e}")))?;

        let payload: ExchangeRateResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse ExchangeRate-API response"
                );
                return Err(CoreError::Fetch(format!(
                    "ExchangeRate-API malformed payload: {e}"
                )));
            }
        };

        if payload.result != "success" {
            return Err(CoreError::Fetch(format!(
                "ExchangeRate-API error: {}",
                payload.error_type.as_deref().unwrap_or("unknown error")
            )));
        }

        let base = payload
            .base_code
            .unwrap_or_else(|| self.base_currency.clone());
        let quotes = self
            .fiats
            .iter()
            .filter(|fiat| **fiat != base)
            .filter_map(|fiat| {
                payload.rates.get(fiat).map(|rate| RawQuote {
                    base: base.clone(),
                    quote: fiat.clone(),
                    rate: *rate,
                })
            })
            .collect();
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fiats() -> Vec<String> {
        ["EUR", "GBP", "RUB"].map(str::to_string).to_vec()
    }

    async fn create_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    const MOCK_JSON: &str = r#"{
        "result": "success",
        "base_code": "USD",
        "rates": {"USD": 1.0, "EUR": 0.927, "GBP": 0.789, "JPY": 149.2}
    }"#;

    #[tokio::test]
    async fn test_fetch_quotes() {
        let mock_server = create_mock_server(MOCK_JSON).await;
        let source = ExchangeRateSource::new(&mock_server.uri(), "test-key", "USD", fiats());

        let quotes = source.fetch().await.unwrap();
        // RUB is tracked but absent upstream; JPY present but untracked.
        assert_eq!(quotes.len(), 2);
        let eur = quotes.iter().find(|q| q.quote == "EUR").unwrap();
        assert_eq!(eur.base, "USD");
        assert_eq!(eur.rate, 0.927);
    }

    #[tokio::test]
    async fn test_api_level_error_is_fetch_error() {
        let mock_server =
            create_mock_server(r#"{"result": "error", "error-type": "invalid-key"}"#).await;
        let source = ExchangeRateSource::new(&mock_server.uri(), "test-key", "USD", fiats());

        let err = source.fetch().await.unwrap_err();
        match err {
            CoreError::Fetch(msg) => assert!(msg.contains("invalid-key")),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_is_fetch_error() {
        let mock_server = create_mock_server("<html>busy</html>").await;
        let source = ExchangeRateSource::new(&mock_server.uri(), "test-key", "USD", fiats());

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch(_)));
    }
}
