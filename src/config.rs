use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::analysis::AnalysisConfig;
use crate::error::{Result, XboostError};
use crate::rate_limit::RateLimitConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rules_path: PathBuf,
    pub web_root: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            rules_path: PathBuf::from("data/rules.json"),
            web_root: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XboostConfig {
    pub analysis: AnalysisConfig,
    pub rate_limit: RateLimitConfig,
    pub server: ServerConfig,
}

impl XboostConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| XboostError::Config(format!("failed to read config: {}", err)))?;
                Self::from_toml(&contents)?
            }
            _ => XboostConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| XboostError::Config(format!("failed to serialize config: {}", err)))?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_parse::<u64>("VIRAL_THRESHOLD") {
            self.analysis.viral_threshold = value;
        }
        if let Some(value) = env_parse::<usize>("SAMPLE_HOOK_LIMIT") {
            self.analysis.sample_hook_limit = value;
        }
        if let Some(value) = env_parse::<u32>("RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = value;
        }
        if let Some(value) = env_parse::<u64>("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = value;
        }
        if let Ok(path) = env::var("RULES_PATH") {
            if !path.trim().is_empty() {
                self.server.rules_path = PathBuf::from(path);
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring unparsable environment override");
            None
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("XBOOST_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/xboost.toml")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = XboostConfig::from_toml(
            r#"
            [analysis]
            viral_threshold = 5000
            sample_hook_limit = 3
            length_band_low = 0.8
            length_band_high = 1.2
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.viral_threshold, 5000);
        assert_eq!(config.rate_limit.max_requests, RateLimitConfig::default().max_requests);
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/xboost.toml");
        let mut config = XboostConfig::default();
        config.rate_limit.window_secs = 30;
        config.write(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded = XboostConfig::from_toml(&contents).unwrap();
        assert_eq!(loaded.rate_limit.window_secs, 30);
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let err = XboostConfig::from_toml("analysis = 3").unwrap_err();
        assert!(matches!(err, XboostError::Toml(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
