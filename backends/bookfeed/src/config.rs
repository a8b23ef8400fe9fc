use anyhow::Context;
use serde::Deserialize;

use crate::telemetry::LogFormat;

/// Process configuration, read from the environment (and `.env` when present).
#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_second: u64,
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default = "default_recommendation_model")]
    pub recommendation_model: String,
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        envy::from_env::<Config>().context("invalid environment configuration")
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_access_token_minutes() -> i64 {
    60
}

fn default_refresh_token_days() -> i64 {
    30
}

fn default_rate_limit() -> u64 {
    50
}

fn default_llm_base_url() -> String {
    "https://models.inference.ai.azure.com".to_string()
}

fn default_recommendation_model() -> String {
    "gpt-4o".to_string()
}

fn default_summary_model() -> String {
    "gpt-4.1".to_string()
}

fn default_summary_max_chars() -> usize {
    24_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fills_defaults_for_optional_settings() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/bookfeed"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.access_token_minutes, 60);
        assert_eq!(config.recommendation_model, "gpt-4o");
        assert_eq!(config.summary_max_chars, 24_000);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.llm_api_key.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/bookfeed"),
            ("JWT_SECRET", "secret"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("RATE_LIMIT_PER_SECOND", "5"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.rate_limit_per_second, 5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn requires_database_url() {
        let result = envy::from_iter::<_, Config>(vars(&[("JWT_SECRET", "secret")]));
        assert!(result.is_err());
    }
}
