pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod log;
pub mod providers;
pub mod refresh;
pub mod store;

use crate::auth::UserManager;
use crate::cli::ui;
use crate::config::AppConfig;
use crate::core::currency::{CurrencyCode, CurrencyRegistry};
use crate::core::portfolio::TradeDirection;
use crate::core::rates::RateTable;
use crate::core::trade::TradeExecutor;
use crate::core::valuation::ValuationEngine;
use crate::providers::QuoteSource;
use crate::providers::coingecko::{CoinGeckoSource, CoinId, default_coin_id};
use crate::providers::exchangerate::ExchangeRateSource;
use crate::refresh::RateRefresher;
use crate::store::disk::DiskStore;
use crate::store::{RatesStore, UserStore};
use anyhow::{Context, Result, bail};
use chrono::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Register { username: String, password: String },
    Login { username: String, password: String },
    Logout,
    ShowPortfolio { base: Option<String> },
    Buy { currency: String, amount: f64 },
    Sell { currency: String, amount: f64 },
    GetRate { from: String, to: String },
    UpdateRates { source: Option<String> },
    ShowRates { currency: Option<String> },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Valuta starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.data_path()?;
    std::fs::create_dir_all(&data_path)
        .with_context(|| format!("Failed to create data directory: {}", data_path.display()))?;
    let store = DiskStore::open(&data_path)?;

    dispatch(command, &config, &store).await
}

/// Command dispatch over any store implementation; tests drive this with
/// the in-memory store.
pub async fn dispatch<S>(command: AppCommand, config: &AppConfig, store: &S) -> Result<()>
where
    S: RatesStore + UserStore,
{
    let registry = CurrencyRegistry::new();
    let anchor: CurrencyCode = config.anchor_currency.parse()?;
    let ttl = Duration::minutes(config.rates_ttl_minutes);

    match command {
        AppCommand::Register { username, password } => {
            let user = UserManager::new(store).register(
                &username,
                &password,
                &anchor,
                config.starting_balance,
            )?;
            println!(
                "Registered user '{}' (id {}). Starting balance: {:.2} {}",
                user.username, user.id, config.starting_balance, anchor
            );
            println!("Log in with: valuta login --username {} --password ...", user.username);
        }

        AppCommand::Login { username, password } => {
            let user = UserManager::new(store).login(&username, &password)?;
            println!("Logged in as '{}'.", user.username);
        }

        AppCommand::Logout => match UserManager::new(store).logout()? {
            Some(name) => println!("Logged out '{name}'."),
            None => println!("No active session."),
        },

        AppCommand::ShowPortfolio { base } => {
            let user = UserManager::new(store).current_user()?;
            let table = load_table(store, &anchor)?;
            let base_code = registry
                .resolve(base.as_deref().unwrap_or(anchor.as_str()))?
                .code
                .clone();

            let valuation = ValuationEngine::new(&table).valuate(&user.portfolio, &base_code);
            println!("{}", cli::portfolio::render(&user.username, &valuation, &registry));
            print_staleness_warning(&table, ttl);
        }

        AppCommand::Buy { currency, amount } => {
            execute_trade(config, store, &registry, TradeDirection::Buy, &currency, amount)?;
        }

        AppCommand::Sell { currency, amount } => {
            execute_trade(config, store, &registry, TradeDirection::Sell, &currency, amount)?;
        }

        AppCommand::GetRate { from, to } => {
            let table = load_table(store, &anchor)?;
            let from_code = registry.resolve(&from)?.code.clone();
            let to_code = registry.resolve(&to)?.code.clone();

            let entry = table.lookup(&from_code, &to_code)?;
            println!("{}", cli::rates::render_rate(&from_code, &to_code, &entry, ttl));
        }

        AppCommand::UpdateRates { source } => {
            update_rates(config, store, &anchor, source.as_deref()).await?;
        }

        AppCommand::ShowRates { currency } => {
            let table = load_table(store, &anchor)?;
            let filter = currency
                .as_deref()
                .map(|c| c.parse::<CurrencyCode>())
                .transpose()?;
            println!("{}", cli::rates::render_table(&table, filter.as_ref(), ttl));
        }

        AppCommand::Currencies => {
            for currency in registry.all() {
                println!("{}", currency.display_info());
            }
        }
    }
    Ok(())
}

fn execute_trade<S>(
    config: &AppConfig,
    store: &S,
    registry: &CurrencyRegistry,
    direction: TradeDirection,
    currency: &str,
    amount: f64,
) -> Result<()>
where
    S: RatesStore + UserStore,
{
    let anchor: CurrencyCode = config.anchor_currency.parse()?;
    let mut user = UserManager::new(store).current_user()?;
    let table = load_table(store, &anchor)?;
    let currency_code = registry.resolve(currency)?.code.clone();

    let executor = TradeExecutor::new(
        &table,
        registry,
        config.trade_max_age_minutes.map(Duration::minutes),
    );
    let outcome = match direction {
        TradeDirection::Buy => executor.buy(&mut user, &currency_code, amount)?,
        TradeDirection::Sell => executor.sell(&mut user, &currency_code, amount)?,
    };

    // The trade is fully applied in memory; persist the user once.
    store.put_user(&user)?;
    println!("{}", cli::trade::render(&outcome, table.anchor(), registry));
    Ok(())
}

fn load_table<S: RatesStore>(store: &S, anchor: &CurrencyCode) -> Result<RateTable> {
    Ok(store
        .load()?
        .unwrap_or_else(|| RateTable::new(anchor.clone())))
}

fn print_staleness_warning(table: &RateTable, ttl: Duration) {
    let stale = match table.last_refresh {
        Some(ts) => chrono::Utc::now() - ts > ttl,
        None => !table.is_empty(),
    };
    if stale || table.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "Note: cached rates may be stale; run `update-rates`.",
                ui::StyleType::Warning,
            )
        );
    }
}

async fn update_rates<S: RatesStore>(
    config: &AppConfig,
    store: &S,
    anchor: &CurrencyCode,
    source_filter: Option<&str>,
) -> Result<()> {
    let wanted = |name: &str| {
        source_filter
            .map(|f| f.eq_ignore_ascii_case(name) || f.eq_ignore_ascii_case("all"))
            .unwrap_or(true)
    };

    let mut sources: Vec<Box<dyn QuoteSource>> = Vec::new();
    if wanted("coingecko") {
        if let Some(provider) = &config.providers.coingecko {
            let coins: Vec<CoinId> = config
                .crypto_currencies
                .iter()
                .filter_map(|code| {
                    default_coin_id(code).map(|id| CoinId {
                        code: code.clone(),
                        id: id.to_string(),
                    })
                })
                .collect();
            sources.push(Box::new(CoinGeckoSource::new(
                &provider.base_url,
                anchor.as_str(),
                coins,
            )));
        }
    }
    if wanted("exchangerate") {
        if let Some(provider) = &config.providers.exchangerate {
            sources.push(Box::new(ExchangeRateSource::new(
                &provider.base_url,
                &provider.api_key,
                anchor.as_str(),
                config.fiat_currencies.clone(),
            )));
        }
    }
    if sources.is_empty() {
        bail!(
            "no quote sources matched '{}'",
            source_filter.unwrap_or("all")
        );
    }

    let mut table = load_table(store, anchor)?;
    let spinner = ui::new_spinner("Fetching rates...");
    let source_refs: Vec<&dyn QuoteSource> = sources.iter().map(|s| s.as_ref()).collect();
    let report = RateRefresher::new(store).refresh(&mut table, &source_refs).await;
    spinner.finish_and_clear();

    println!("{}", cli::rates::render_refresh_report(&report));
    if report.total_written == 0 && report.failed_sources() == report.outcomes.len() {
        bail!("no rates were fetched; all sources failed");
    }
    Ok(())
}
