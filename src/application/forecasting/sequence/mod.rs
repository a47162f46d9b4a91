pub mod dataset;
pub mod early_stopping;
pub mod forecaster;
pub mod network;
pub mod optimizer;
pub mod scaler;

pub use forecaster::{SequenceForecaster, SequenceModelConfig, TrainedSequenceModel};
pub use scaler::MinMaxScaler;
