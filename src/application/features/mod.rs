pub mod feature_engine;
pub mod indicators;

pub use feature_engine::{DEFAULT_MIN_POINTS, FeatureEngine};
