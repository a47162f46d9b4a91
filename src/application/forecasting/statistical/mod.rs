pub mod arima;
pub mod forecaster;
pub mod least_squares;
pub mod order_search;

pub use arima::ArimaFit;
pub use forecaster::{StatisticalForecaster, TrainedStatisticalModel};
