//! Market data provider configuration.

use std::env;

/// CoinGecko API configuration
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub vs_currency: String,
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string()),
            api_key: env::var("COINGECKO_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            vs_currency: env::var("VS_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coingecko_config_defaults() {
        let config = CoinGeckoConfig::from_env();
        assert_eq!(config.base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.vs_currency, "usd");
    }
}
