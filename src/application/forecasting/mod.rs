// Request-scoped cancellation shared with the blocking training work
pub mod cancellation;

// Ensemble blending and confidence scoring
pub mod confidence;
pub mod ensemble;

// Fast path used when training is skipped or runs out of time
pub mod heuristic;

pub mod metrics;

// Model families
pub mod sequence;
pub mod statistical;

// Orchestration
pub mod service;
pub mod session;

pub use cancellation::{CancelOnDrop, CancellationFlag};
pub use heuristic::{HeuristicForecaster, HeuristicVariant};
pub use service::{ForecastMode, ForecastService, ForecastSettings, MAX_FORECAST_DAYS};
pub use session::ForecastSession;
