//! Configuration Management
//!
//! Handles persistent configuration storage for xcsites. Credentials
//! resolve CLI flags first, then environment, then the saved config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_API_URL: &str = "F5XC_API_URL";
pub const ENV_API_TOKEN: &str = "F5XC_API_TOKEN";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used tenant API URL
    #[serde(default)]
    pub api_url: Option<String>,
    /// Last used API token
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("xcsites").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Effective API URL (CLI > environment > saved config)
    pub fn effective_api_url(&self, cli: Option<&str>) -> Option<String> {
        cli.map(String::from)
            .or_else(|| std::env::var(ENV_API_URL).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.api_url.clone())
    }

    /// Effective API token (CLI > environment > saved config)
    pub fn effective_api_token(&self, cli: Option<&str>) -> Option<String> {
        cli.map(String::from)
            .or_else(|| std::env::var(ENV_API_TOKEN).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.api_token.clone())
    }

    /// Remember credentials for the next run
    pub fn set_credentials(&mut self, api_url: &str, api_token: &str) -> Result<()> {
        self.api_url = Some(api_url.to_string());
        self.api_token = Some(api_token.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_value_wins_over_saved_config() {
        let cfg = Config {
            api_url: Some("https://saved/api".into()),
            api_token: None,
        };
        assert_eq!(
            cfg.effective_api_url(Some("https://cli/api")),
            Some("https://cli/api".to_string())
        );
    }

    #[test]
    fn saved_config_is_the_fallback() {
        let cfg = Config {
            api_url: Some("https://saved/api".into()),
            api_token: Some("saved-token".into()),
        };
        // Environment is unset in the test run for these keys
        if std::env::var(ENV_API_URL).is_err() {
            assert_eq!(
                cfg.effective_api_url(None),
                Some("https://saved/api".to_string())
            );
        }
        if std::env::var(ENV_API_TOKEN).is_err() {
            assert_eq!(
                cfg.effective_api_token(None),
                Some("saved-token".to_string())
            );
        }
    }

    #[test]
    fn missing_everywhere_is_none() {
        let cfg = Config::default();
        if std::env::var(ENV_API_URL).is_err() {
            assert_eq!(cfg.effective_api_url(None), None);
        }
    }
}
