//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::PathBuf;

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_atelier_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config: AppConfig,
}

impl ConfigService {
    /// Create a new config service, loading existing config or creating defaults
    pub fn new() -> AppResult<Self> {
        // Ensure the config directory exists
        ensure_atelier_dir()?;

        let config_path = config_path()?;
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self { config })
    }

    /// Load configuration from a file
    fn load_from_file(path: &PathBuf) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::config)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &PathBuf, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::config)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> AppConfig {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_config_file() -> (NamedTempFile, PathBuf) {
        let mut file = NamedTempFile::new().unwrap();
        let config = AppConfig::default();
        let content = serde_json::to_string_pretty(&config).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let path = file.path().to_path_buf();
        (file, path)
    }

    #[test]
    fn test_load_config_from_file() {
        let (_file, path) = create_test_config_file();
        let config = ConfigService::load_from_file(&path).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8787");
    }

    #[test]
    fn test_save_config_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        let config = AppConfig::default();

        ConfigService::save_to_file(&path, &config).unwrap();

        assert!(path.exists());
        let loaded = ConfigService::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.bind_addr, config.server.bind_addr);
    }

    #[test]
    fn test_invalid_config_rejected_on_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"orchestrator": {"max_rounds": 0}}"#).unwrap();

        let err = ConfigService::load_from_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
