use tracing::info;
use valuta::core::error::CoreError;
use valuta::store::memory::MemoryStore;
use valuta::store::{RatesStore, UserStore};
use valuta::{AppCommand, dispatch};

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const COINGECKO_JSON: &str = r#"{
        "bitcoin": {"usd": 59300.0},
        "ethereum": {"usd": 3720.5},
        "solana": {"usd": 151.2}
    }"#;

    pub const EXCHANGERATE_JSON: &str = r#"{
        "result": "success",
        "base_code": "USD",
        "rates": {"USD": 1.0, "EUR": 0.9012, "GBP": 0.7788, "RUB": 92.5}
    }"#;

    pub async fn coingecko_mock(response: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(ResponseTemplate::new(status).set_body_string(response))
            .mount(&server)
            .await;
        server
    }

    pub async fn exchangerate_mock(response: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(response))
            .mount(&server)
            .await;
        server
    }

    /// Config pointed at the two mock servers, seeding generous balances.
    pub fn mock_config(gecko_url: &str, fx_url: &str) -> valuta::config::AppConfig {
        let yaml = format!(
            r#"
anchor_currency: "USD"
starting_balance: 100000.0
providers:
  coingecko:
    base_url: "{gecko_url}"
  exchangerate:
    base_url: "{fx_url}"
    api_key: "test-key"
fiat_currencies: ["EUR", "GBP", "RUB"]
crypto_currencies: ["BTC", "ETH", "SOL"]
rates_ttl_minutes: 5
"#
        );
        serde_yaml::from_str(&yaml).expect("test config parses")
    }
}

#[test_log::test(tokio::test)]
async fn test_update_rates_populates_cache() {
    let gecko = test_utils::coingecko_mock(test_utils::COINGECKO_JSON, 200).await;
    let fx = test_utils::exchangerate_mock(test_utils::EXCHANGERATE_JSON, 200).await;
    let config = test_utils::mock_config(&gecko.uri(), &fx.uri());
    let store = MemoryStore::new();

    dispatch(AppCommand::UpdateRates { source: None }, &config, &store)
        .await
        .expect("refresh succeeds");

    let table = store.load().unwrap().expect("rates were persisted");
    assert!(table.last_refresh.is_some());

    let btc_usd = table
        .lookup(&"BTC".parse().unwrap(), &"USD".parse().unwrap())
        .unwrap();
    assert_eq!(btc_usd.rate, 59300.0);
    assert_eq!(btc_usd.source, "CoinGecko");

    // Cross rate through the anchor: BTC -> USD -> EUR.
    let btc_eur = table
        .lookup(&"BTC".parse().unwrap(), &"EUR".parse().unwrap())
        .unwrap();
    assert_eq!(btc_eur.source, "derived");
    assert!((btc_eur.rate - 59300.0 * 0.9012).abs() < 0.01);
}

#[test_log::test(tokio::test)]
async fn test_update_rates_source_filter() {
    let gecko = test_utils::coingecko_mock(test_utils::COINGECKO_JSON, 200).await;
    // Deliberately broken fiat source; the filter must keep it out of the run.
    let fx = test_utils::exchangerate_mock("unreachable", 500).await;
    let config = test_utils::mock_config(&gecko.uri(), &fx.uri());
    let store = MemoryStore::new();

    dispatch(
        AppCommand::UpdateRates {
            source: Some("coingecko".to_string()),
        },
        &config,
        &store,
    )
    .await
    .expect("crypto-only refresh succeeds");

    let table = store.load().unwrap().expect("rates were persisted");
    assert!(
        table
            .lookup(&"BTC".parse().unwrap(), &"USD".parse().unwrap())
            .is_ok()
    );
    assert!(
        table
            .lookup(&"USD".parse().unwrap(), &"EUR".parse().unwrap())
            .is_err()
    );
}

#[test_log::test(tokio::test)]
async fn test_update_rates_all_sources_down() {
    let gecko = test_utils::coingecko_mock("oops", 500).await;
    let fx = test_utils::exchangerate_mock("oops", 500).await;
    let config = test_utils::mock_config(&gecko.uri(), &fx.uri());
    let store = MemoryStore::new();

    let result = dispatch(AppCommand::UpdateRates { source: None }, &config, &store).await;
    assert!(result.is_err());

    // The snapshot written back is still empty and carries no freshness claim.
    let table = store.load().unwrap().expect("empty snapshot persisted");
    assert!(table.is_empty());
    assert!(table.last_refresh.is_none());
}

#[test_log::test(tokio::test)]
async fn test_register_login_trade_flow() {
    let gecko = test_utils::coingecko_mock(test_utils::COINGECKO_JSON, 200).await;
    let fx = test_utils::exchangerate_mock(test_utils::EXCHANGERATE_JSON, 200).await;
    let config = test_utils::mock_config(&gecko.uri(), &fx.uri());
    let store = MemoryStore::new();

    dispatch(
        AppCommand::Register {
            username: "alice".to_string(),
            password: "hunter22".to_string(),
        },
        &config,
        &store,
    )
    .await
    .expect("register succeeds");

    dispatch(
        AppCommand::Login {
            username: "alice".to_string(),
            password: "hunter22".to_string(),
        },
        &config,
        &store,
    )
    .await
    .expect("login succeeds");

    dispatch(AppCommand::UpdateRates { source: None }, &config, &store)
        .await
        .expect("refresh succeeds");

    dispatch(
        AppCommand::Buy {
            currency: "BTC".to_string(),
            amount: 0.05,
        },
        &config,
        &store,
    )
    .await
    .expect("buy succeeds");

    let user = store.get_user("alice").unwrap().expect("user exists");
    info!(balances = ?user.portfolio, "Post-buy portfolio");
    // 0.05 BTC at 59300 costs 2965.00 from the 100000 seed.
    assert_eq!(user.portfolio.balance(&"USD".parse().unwrap()), 97035.0);
    assert_eq!(user.portfolio.balance(&"BTC".parse().unwrap()), 0.05);
    assert_eq!(user.trades.len(), 1);

    dispatch(
        AppCommand::Sell {
            currency: "BTC".to_string(),
            amount: 0.05,
        },
        &config,
        &store,
    )
    .await
    .expect("sell succeeds");

    let user = store.get_user("alice").unwrap().expect("user exists");
    assert_eq!(user.portfolio.balance(&"USD".parse().unwrap()), 100000.0);
    assert_eq!(user.portfolio.balance(&"BTC".parse().unwrap()), 0.0);
    assert_eq!(user.trades.len(), 2);

    // Valuation in a non-anchor base exercises the derived cross rates.
    dispatch(
        AppCommand::ShowPortfolio {
            base: Some("EUR".to_string()),
        },
        &config,
        &store,
    )
    .await
    .expect("valuation succeeds");
}

#[test_log::test(tokio::test)]
async fn test_trade_requires_session() {
    let config = test_utils::mock_config("http://unused.invalid", "http://unused.invalid");
    let store = MemoryStore::new();

    let err = dispatch(
        AppCommand::Buy {
            currency: "BTC".to_string(),
            amount: 1.0,
        },
        &config,
        &store,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::NotLoggedIn)
    ));
}

#[test_log::test(tokio::test)]
async fn test_insufficient_funds_leaves_user_unchanged() {
    let gecko = test_utils::coingecko_mock(test_utils::COINGECKO_JSON, 200).await;
    let fx = test_utils::exchangerate_mock(test_utils::EXCHANGERATE_JSON, 200).await;
    let config = test_utils::mock_config(&gecko.uri(), &fx.uri());
    let store = MemoryStore::new();

    dispatch(
        AppCommand::Register {
            username: "bob".to_string(),
            password: "hunter22".to_string(),
        },
        &config,
        &store,
    )
    .await
    .unwrap();
    dispatch(
        AppCommand::Login {
            username: "bob".to_string(),
            password: "hunter22".to_string(),
        },
        &config,
        &store,
    )
    .await
    .unwrap();
    dispatch(AppCommand::UpdateRates { source: None }, &config, &store)
        .await
        .unwrap();

    // 100 BTC at 59300 is far beyond the 100000 seed.
    let err = dispatch(
        AppCommand::Buy {
            currency: "BTC".to_string(),
            amount: 100.0,
        },
        &config,
        &store,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::InsufficientFunds { .. })
    ));

    let user = store.get_user("bob").unwrap().unwrap();
    assert_eq!(user.portfolio.balance(&"USD".parse().unwrap()), 100000.0);
    assert!(user.trades.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_full_flow_on_disk() {
    use valuta::run_command;

    let gecko = test_utils::coingecko_mock(test_utils::COINGECKO_JSON, 200).await;
    let fx = test_utils::exchangerate_mock(test_utils::EXCHANGERATE_JSON, 200).await;

    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data");
    let config_path = dir.path().join("config.yaml");
    let config_yaml = format!(
        r#"
anchor_currency: "USD"
starting_balance: 100000.0
providers:
  coingecko:
    base_url: "{}"
  exchangerate:
    base_url: "{}"
    api_key: "test-key"
data_path: "{}"
"#,
        gecko.uri(),
        fx.uri(),
        data_path.display()
    );
    std::fs::write(&config_path, config_yaml).unwrap();
    let config_path = config_path.to_str().unwrap();

    run_command(
        AppCommand::Register {
            username: "carol".to_string(),
            password: "hunter22".to_string(),
        },
        Some(config_path),
    )
    .await
    .expect("register succeeds");

    run_command(
        AppCommand::Login {
            username: "carol".to_string(),
            password: "hunter22".to_string(),
        },
        Some(config_path),
    )
    .await
    .expect("login succeeds");

    run_command(AppCommand::UpdateRates { source: None }, Some(config_path))
        .await
        .expect("refresh succeeds");

    run_command(
        AppCommand::Buy {
            currency: "ETH".to_string(),
            amount: 2.0,
        },
        Some(config_path),
    )
    .await
    .expect("buy succeeds");

    // Everything above ran against separate store instances, so state held
    // on disk between invocations.
    let store = valuta::store::disk::DiskStore::open(&data_path).unwrap();
    let user = store.get_user("carol").unwrap().expect("user persisted");
    assert_eq!(user.portfolio.balance(&"ETH".parse().unwrap()), 2.0);
    assert_eq!(user.portfolio.balance(&"USD".parse().unwrap()), 92559.0);
    assert!(store.load().unwrap().is_some());
}
