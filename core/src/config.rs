//! Configuration Management Module
//!
//! Application settings assembled from built-in defaults overlaid with
//! environment variables. Upload limits are fixed and live in
//! [`crate::store`].

use chrono::Duration;
use config::{Config, Environment, Map};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{DEFAULT_MAX_MESSAGES, DEFAULT_TTL_MINUTES};
use crate::error::ConfigError;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key; empty when unconfigured
    #[serde(default)]
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout_seconds: u64,
    pub backend_host: String,
    pub backend_port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    pub max_context_messages: usize,
    pub context_ttl_minutes: i64,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: "gemini-pro".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            llm_timeout_seconds: 60,
            backend_host: "0.0.0.0".to_string(),
            backend_port: 8000,
            frontend_url: "http://localhost:5173".to_string(),
            max_context_messages: DEFAULT_MAX_MESSAGES,
            context_ttl_minutes: DEFAULT_TTL_MINUTES,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default().try_parsing(true))
    }

    /// Load settings from an explicit variable map instead of the process
    /// environment
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::default().try_parsing(true).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Config::builder()
            .set_default("gemini_api_key", defaults.gemini_api_key)?
            .set_default("gemini_model", defaults.gemini_model)?
            .set_default("gemini_base_url", defaults.gemini_base_url)?
            .set_default("llm_timeout_seconds", defaults.llm_timeout_seconds)?
            .set_default("backend_host", defaults.backend_host)?
            .set_default("backend_port", i64::from(defaults.backend_port))?
            .set_default("frontend_url", defaults.frontend_url)?
            .set_default("max_context_messages", defaults.max_context_messages as u64)?
            .set_default("context_ttl_minutes", defaults.context_ttl_minutes)?
            .set_default("log_format", "pretty")?
            .add_source(environment)
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        debug!(
            host = %app_config.backend_host,
            port = app_config.backend_port,
            model = %app_config.gemini_model,
            "Loaded configuration"
        );
        Ok(app_config)
    }

    /// Whether an LLM API key is present
    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    /// Validate required settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.has_api_key() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// Session expiry window; rejects negative or unrepresentable values
    pub fn context_ttl(&self) -> Result<Duration, ConfigError> {
        if self.context_ttl_minutes < 0 {
            return Err(ConfigError::Invalid(format!(
                "CONTEXT_TTL_MINUTES must not be negative, got {}",
                self.context_ttl_minutes
            )));
        }
        Duration::try_minutes(self.context_ttl_minutes).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "CONTEXT_TTL_MINUTES is out of range: {}",
                self.context_ttl_minutes
            ))
        })
    }

    /// Origins allowed to call the API from a browser
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![self.frontend_url.clone()];
        for fallback in ["http://localhost:5173", "http://localhost:3000"] {
            if !origins.iter().any(|o| o == fallback) {
                origins.push(fallback.to_string());
            }
        }
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(Map::new()).unwrap();
        assert_eq!(config.backend_host, "0.0.0.0");
        assert_eq!(config.backend_port, 8000);
        assert_eq!(config.max_context_messages, 5);
        assert_eq!(config.context_ttl_minutes, 60);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("GEMINI_API_KEY", "secret"),
            ("BACKEND_PORT", "9001"),
            ("FRONTEND_URL", "https://rooms.example.com"),
            ("MAX_CONTEXT_MESSAGES", "8"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.gemini_api_key, "secret");
        assert_eq!(config.backend_port, 9001);
        assert_eq!(config.frontend_url, "https://rooms.example.com");
        assert_eq!(config.max_context_messages, 8);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_context_ttl() {
        let config = AppConfig::from_vars(vars(&[("CONTEXT_TTL_MINUTES", "90")])).unwrap();
        assert_eq!(config.context_ttl().unwrap(), Duration::minutes(90));

        let zero = AppConfig {
            context_ttl_minutes: 0,
            ..AppConfig::default()
        };
        assert_eq!(zero.context_ttl().unwrap(), Duration::zero());
    }

    #[test]
    fn test_context_ttl_rejects_out_of_range() {
        let max = i64::MAX.to_string();
        let config = AppConfig::from_vars(vars(&[("CONTEXT_TTL_MINUTES", &max)])).unwrap();
        assert!(matches!(config.context_ttl(), Err(ConfigError::Invalid(_))));

        let negative = AppConfig::from_vars(vars(&[("CONTEXT_TTL_MINUTES", "-5")])).unwrap();
        assert!(matches!(negative.context_ttl(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_allowed_origins_deduplicated() {
        let config = AppConfig::default();
        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:5173", "http://localhost:3000"]
        );

        let custom = AppConfig {
            frontend_url: "https://app.example.com".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(custom.allowed_origins().len(), 3);
    }
}
