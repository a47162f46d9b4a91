pub mod database;
pub mod forecast_repository;

pub use database::Database;
pub use forecast_repository::SqliteForecastRepository;
