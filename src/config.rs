//! Configuration loader - YAML settings file + .env overrides

use crate::state::RenderSettings;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration loaded from tetration.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderSettings,
    pub backend: BackendConfig,
}

/// Whether arithmetic goes through the numeric backend adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub enabled: bool,
}

/// Environment overrides loaded from .env
#[derive(Debug, Clone)]
pub struct Env {
    pub log_dir: String,
    pub output_dir: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.render.validate()?;
        Ok(config)
    }
}

impl Env {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Env {
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "./output".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "render:\n  n: 64\n  max_iter: 200\n  isDarkMode: true\nbackend:\n  enabled: true\n",
        )
        .unwrap();
        assert_eq!(config.render.n, 64);
        assert_eq!(config.render.max_iter, 200);
        assert!(config.render.is_dark_mode);
        assert_eq!(config.render.eps, RenderSettings::default().eps);
        assert!(config.backend.enabled);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.render, RenderSettings::default());
        assert!(!config.backend.enabled);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(Config::from_yaml("render:\n  n: 0\n").is_err());
    }
}
