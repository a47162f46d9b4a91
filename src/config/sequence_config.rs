//! Sequence model hyperparameters from environment variables.

use super::parse_var;
use crate::application::forecasting::sequence::SequenceModelConfig;
use anyhow::Result;

/// LSTM environment configuration
#[derive(Debug, Clone)]
pub struct SequenceEnvConfig {
    pub window: usize,
    pub hidden_units: usize,
    pub layers: usize,
    pub dense_units: usize,
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub patience: usize,
    pub learning_rate: f64,
    pub validation_split: f64,
    pub seed: u64,
}

impl SequenceEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = SequenceModelConfig::default();

        let config = Self {
            window: parse_var("LSTM_WINDOW", defaults.window)?,
            hidden_units: parse_var("LSTM_HIDDEN_UNITS", defaults.hidden_units)?,
            layers: parse_var("LSTM_LAYERS", defaults.layers)?,
            dense_units: parse_var("LSTM_DENSE_UNITS", defaults.dense_units)?,
            dropout: parse_var("LSTM_DROPOUT", defaults.dropout)?,
            epochs: parse_var("LSTM_EPOCHS", defaults.epochs)?,
            batch_size: parse_var("LSTM_BATCH_SIZE", defaults.batch_size)?,
            patience: parse_var("LSTM_PATIENCE", defaults.patience)?,
            learning_rate: parse_var("LSTM_LEARNING_RATE", defaults.learning_rate)?,
            validation_split: parse_var("LSTM_VALIDATION_SPLIT", defaults.validation_split)?,
            seed: parse_var("LSTM_SEED", defaults.seed)?,
        };

        config
            .to_model_config()
            .validate()
            .map_err(|reason| anyhow::anyhow!("Invalid LSTM configuration: {}", reason))?;

        Ok(config)
    }

    pub fn to_model_config(&self) -> SequenceModelConfig {
        SequenceModelConfig {
            window: self.window,
            hidden_units: self.hidden_units,
            layers: self.layers,
            dense_units: self.dense_units,
            dropout: self.dropout,
            epochs: self.epochs,
            batch_size: self.batch_size,
            patience: self.patience,
            learning_rate: self.learning_rate,
            validation_split: self.validation_split,
            seed: self.seed,
        }
    }
}
