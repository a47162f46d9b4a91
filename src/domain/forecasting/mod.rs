pub mod features;
pub mod order;
pub mod types;

pub use features::{FEATURE_COUNT, FeatureSeries, FeatureVector, PRICE_FEATURE};
pub use order::ModelOrder;
pub use types::{
    ENSEMBLE_LABEL, ForecastMetrics, ForecastPoint, ForecastRequest, ForecastResult,
    ForecastRun, ModelType, PRICE_FLOOR,
};
