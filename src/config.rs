use crate::domain::RedistributionPolicy;
use crate::engine::MatchingMode;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PRICE_API_URL: &str = "https://public-api.birdeye.so";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub price_api_url: String,
    pub price_api_key: String,
    pub oracle_timeout_ms: u64,
    pub default_policy: RedistributionPolicy,
    pub matching_mode: MatchingMode,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let price_api_url = env_map
            .get("PRICE_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PRICE_API_URL.to_string());

        let price_api_key = env_map
            .get("PRICE_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("PRICE_API_KEY".to_string()))?;

        let oracle_timeout_ms = env_map
            .get("ORACLE_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "ORACLE_TIMEOUT_MS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let default_policy = match env_map.get("REDISTRIBUTION_POLICY") {
            None => RedistributionPolicy::default(),
            Some(raw) => raw.parse::<RedistributionPolicy>().map_err(|_| {
                ConfigError::InvalidValue(
                    "REDISTRIBUTION_POLICY".to_string(),
                    format!("must be equal, proportional, or clawback, got {}", raw),
                )
            })?,
        };

        let matching_mode = match env_map.get("MATCHING_MODE") {
            None => MatchingMode::default(),
            Some(raw) => raw.parse::<MatchingMode>().map_err(|_| {
                ConfigError::InvalidValue(
                    "MATCHING_MODE".to_string(),
                    format!("must be causal or carry_forward, got {}", raw),
                )
            })?,
        };

        Ok(Config {
            port,
            price_api_url,
            price_api_key,
            oracle_timeout_ms,
            default_policy,
            matching_mode,
        })
    }

    /// Timeout of a single HTTP request to the data provider.
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    /// Budget for one oracle lookup including retries.
    pub fn lookup_timeout(&self) -> Duration {
        self.oracle_timeout() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("PRICE_API_KEY".to_string(), "secret".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.price_api_url, DEFAULT_PRICE_API_URL);
        assert_eq!(config.oracle_timeout(), Duration::from_secs(10));
        assert_eq!(config.lookup_timeout(), Duration::from_secs(40));
        assert_eq!(config.default_policy, RedistributionPolicy::EqualShare);
        assert_eq!(config.matching_mode, MatchingMode::Causal);
    }

    #[test]
    fn test_missing_api_key() {
        let mut env_map = setup_required_env();
        env_map.remove("PRICE_API_KEY");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "PRICE_API_KEY"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut env_map = setup_required_env();
        env_map.insert("PRICE_API_KEY".to_string(), "  ".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::MissingEnv(_))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("ORACLE_TIMEOUT_MS".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "ORACLE_TIMEOUT_MS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_policy_and_matching_mode() {
        let mut env_map = setup_required_env();
        env_map.insert("REDISTRIBUTION_POLICY".to_string(), "clawback".to_string());
        env_map.insert("MATCHING_MODE".to_string(), "carry_forward".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.default_policy, RedistributionPolicy::FullClawback);
        assert_eq!(config.matching_mode, MatchingMode::CarryForward);
    }

    #[test]
    fn test_invalid_policy() {
        let mut env_map = setup_required_env();
        env_map.insert("REDISTRIBUTION_POLICY".to_string(), "custom".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "REDISTRIBUTION_POLICY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
