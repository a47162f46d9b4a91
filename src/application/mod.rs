// Feature engineering over raw market history
pub mod features;

// Model training, ensembling and the forecast service
pub mod forecasting;
