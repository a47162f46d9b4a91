// Market data adapters
pub mod coingecko;
pub mod file;

// Shared HTTP plumbing
pub mod core;

// Forecast run storage
pub mod persistence;
pub mod repositories;

pub use coingecko::CoinGeckoHistoryProvider;
pub use file::CsvHistoryProvider;
pub use persistence::{Database, SqliteForecastRepository};
pub use repositories::InMemoryForecastRepository;
