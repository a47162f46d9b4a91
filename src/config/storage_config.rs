//! Forecast persistence configuration.

use super::parse_bool;
use std::env;

#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub enabled: bool,
    pub database_url: String,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database_url: "sqlite://data/forecasts.db".to_string(),
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: parse_bool("PERSISTENCE_ENABLED", defaults.enabled),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageEnvConfig::from_env();
        assert!(!config.enabled);
        assert_eq!(config.database_url, "sqlite://data/forecasts.db");
    }
}
