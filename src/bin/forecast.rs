//! Price Forecast Binary
//!
//! Runs one forecast and prints the result JSON to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pricecast::application::forecasting::{ForecastMode, ForecastService};
use pricecast::config::Config;
use pricecast::domain::forecasting::{ForecastRequest, ForecastResult, ModelType};
use pricecast::domain::ports::HistoricalDataProvider;
use pricecast::infrastructure::{
    CoinGeckoHistoryProvider, CsvHistoryProvider, Database, SqliteForecastRepository,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Multi-day crypto price forecaster", long_about = None)]
struct Cli {
    /// Override FORECAST_MODE (trained, heuristic)
    #[arg(long, global = true)]
    mode: Option<String>,

    /// Write the result JSON to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast from a JSON request file
    Run {
        /// Request with coin_id, symbol, historical_data and current_price
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Forecast from a CSV history file (date,price,volume)
    Csv {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, default_value = "asset")]
        coin_id: String,

        #[arg(long, default_value = "ASSET")]
        symbol: String,

        #[arg(short, long)]
        days: Option<u32>,

        /// LSTM or ARIMA
        #[arg(long)]
        model_type: Option<String>,
    },
    /// Fetch history from CoinGecko and forecast
    Coin {
        #[arg(long, default_value = "bitcoin")]
        coin_id: String,

        #[arg(long, default_value = "BTC")]
        symbol: String,

        #[arg(short, long)]
        days: Option<u32>,

        /// LSTM or ARIMA
        #[arg(long)]
        model_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let mut settings = config.to_forecast_settings();
    if let Some(mode) = &cli.mode {
        settings.mode = ForecastMode::from_str(mode)?;
    }

    let mut service = ForecastService::new(settings);
    if config.storage.enabled {
        let db = Database::new(&config.storage.database_url)
            .await
            .context("Failed to initialize database")?;
        service = service.with_repository(Arc::new(SqliteForecastRepository::new(db.pool)));
    }

    let result = match cli.command {
        Commands::Run { input } => {
            let raw = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let request: ForecastRequest =
                serde_json::from_str(&raw).context("Failed to parse forecast request")?;
            service.forecast(&request).await?
        }
        Commands::Csv {
            file,
            coin_id,
            symbol,
            days,
            model_type,
        } => {
            let provider: Arc<dyn HistoricalDataProvider> = Arc::new(CsvHistoryProvider::new(file));
            forecast_from_provider(service, provider, &coin_id, &symbol, days, model_type).await?
        }
        Commands::Coin {
            coin_id,
            symbol,
            days,
            model_type,
        } => {
            let provider: Arc<dyn HistoricalDataProvider> =
                Arc::new(CoinGeckoHistoryProvider::new(&config.coingecko));
            forecast_from_provider(service, provider, &coin_id, &symbol, days, model_type).await?
        }
    };

    write_result(&result, cli.output.as_ref()).await
}

async fn forecast_from_provider(
    service: ForecastService,
    provider: Arc<dyn HistoricalDataProvider>,
    coin_id: &str,
    symbol: &str,
    days: Option<u32>,
    model_type: Option<String>,
) -> Result<ForecastResult> {
    let model_type = model_type.as_deref().map(ModelType::from_str).transpose()?;
    let service = service.with_history_provider(provider);
    Ok(service.forecast_coin(coin_id, symbol, days, model_type).await?)
}

async fn write_result(result: &ForecastResult, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Forecast written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
