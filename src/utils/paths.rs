//! Filesystem Paths
//!
//! Locations of the application's config and data files.

use std::fs;
use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

const APP_DIR_NAME: &str = ".atelier";

/// Get the application directory (~/.atelier)
pub fn atelier_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::config("Could not determine home directory"))?;
    Ok(home.join(APP_DIR_NAME))
}

/// Ensure the application directory exists, creating it if necessary
pub fn ensure_atelier_dir() -> AppResult<PathBuf> {
    let dir = atelier_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Path of the JSON configuration file
pub fn config_path() -> AppResult<PathBuf> {
    Ok(atelier_dir()?.join("config.json"))
}

/// Path of the SQLite database
pub fn database_path() -> AppResult<PathBuf> {
    Ok(atelier_dir()?.join("data.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_live_under_app_dir() {
        let dir = atelier_dir().unwrap();
        assert!(dir.ends_with(APP_DIR_NAME));
        assert!(config_path().unwrap().starts_with(&dir));
        assert!(database_path().unwrap().starts_with(&dir));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(config_path().unwrap().file_name().unwrap(), "config.json");
        assert_eq!(database_path().unwrap().file_name().unwrap(), "data.db");
    }
}
