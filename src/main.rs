use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use valuta::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for valuta::AppCommand {
    fn from(cmd: Commands) -> valuta::AppCommand {
        match cmd {
            Commands::Register { username, password } => {
                valuta::AppCommand::Register { username, password }
            }
            Commands::Login { username, password } => {
                valuta::AppCommand::Login { username, password }
            }
            Commands::Logout => valuta::AppCommand::Logout,
            Commands::ShowPortfolio { base } => valuta::AppCommand::ShowPortfolio { base },
            Commands::Buy { currency, amount } => valuta::AppCommand::Buy { currency, amount },
            Commands::Sell { currency, amount } => valuta::AppCommand::Sell { currency, amount },
            Commands::GetRate { from, to } => valuta::AppCommand::GetRate { from, to },
            Commands::UpdateRates { source } => valuta::AppCommand::UpdateRates { source },
            Commands::ShowRates { currency } => valuta::AppCommand::ShowRates { currency },
            Commands::Currencies => valuta::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Register a new user account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and open a session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Close the current session
    Logout,
    /// Display the current user's portfolio valuation
    ShowPortfolio {
        /// Currency to value the portfolio in (defaults to the anchor)
        #[arg(long)]
        base: Option<String>,
    },
    /// Buy a currency, paying from the anchor balance
    Buy {
        #[arg(long)]
        currency: String,
        #[arg(long)]
        amount: f64,
    },
    /// Sell a currency, crediting the anchor balance
    Sell {
        #[arg(long)]
        currency: String,
        #[arg(long)]
        amount: f64,
    },
    /// Show one exchange rate from the cache
    GetRate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Fetch fresh rates from the configured sources
    UpdateRates {
        /// Limit to one source: coingecko or exchangerate
        #[arg(long)]
        source: Option<String>,
    },
    /// Show all cached rates
    ShowRates {
        /// Only show pairs involving this currency
        #[arg(long)]
        currency: Option<String>,
    },
    /// List the supported currencies
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => valuta::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = valuta::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
anchor_currency: "USD"
starting_balance: 1000.0

providers:
  coingecko:
    base_url: "https://api.coingecko.com"
  exchangerate:
    base_url: "https://v6.exchangerate-api.com"

fiat_currencies: ["EUR", "GBP", "RUB"]
crypto_currencies: ["BTC", "ETH", "SOL"]

rates_ttl_minutes: 5
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
