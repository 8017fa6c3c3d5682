use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::mode::Mode;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend origin
pub const API_URL_ENV: &str = "RAG_WORKBENCH_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub default_mode: Option<Mode>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: None,
            default_mode: Some(Mode::Simple),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Backend origin: explicit override, then env var, then file, then default
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(API_URL_ENV).ok();
        pick_api_url(cli_override, env_value.as_deref(), self.api_url.as_deref())
    }

    pub fn resolve_mode(&self, cli_override: Option<Mode>) -> Mode {
        cli_override.or(self.default_mode).unwrap_or_default()
    }

    /// `<config_dir>/rag-workbench`, also home of the log file
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rag-workbench"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

fn pick_api_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.api_url.is_none());
        assert_eq!(config.resolve_mode(None), Mode::Simple);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("http://rag.local:9000".into()),
            default_mode: Some(Mode::Agentic),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url.as_deref(), Some("http://rag.local:9000"));
        assert_eq!(loaded.default_mode, Some(Mode::Agentic));
    }

    #[test]
    fn test_api_url_precedence() {
        assert_eq!(pick_api_url(Some("http://cli"), Some("http://env"), Some("http://file")), "http://cli");
        assert_eq!(pick_api_url(None, Some("http://env"), Some("http://file")), "http://env");
        assert_eq!(pick_api_url(None, Some("  "), Some("http://file")), "http://file");
        assert_eq!(pick_api_url(None, None, None), DEFAULT_API_URL);
    }

    #[test]
    fn test_mode_override_beats_file() {
        let config = Config {
            api_url: None,
            default_mode: Some(Mode::Agentic),
        };
        assert_eq!(config.resolve_mode(None), Mode::Agentic);
        assert_eq!(config.resolve_mode(Some(Mode::Simple)), Mode::Simple);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
