//! File System Utilities
//!
//! Platform configuration and data directories.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io", "smartbin", "smartbin-monitor").ok_or_else(|| Error::Invalid {
        message: "Could not determine project directories".to_string(),
    })
}

/// Get or create the configuration directory
///
/// - **Linux**: `~/.config/smartbin-monitor/`
/// - **macOS**: `~/Library/Application Support/io.smartbin.smartbin-monitor/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\smartbin\smartbin-monitor\config\`
pub fn get_or_create_config_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let config_dir = dirs.config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(config_dir)?;
    }
    Ok(config_dir.to_path_buf())
}

/// Get or create the data directory (default home of the fleet snapshot)
pub fn get_or_create_data_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    if !data_dir.exists() {
        fs::create_dir_all(data_dir)?;
    }
    Ok(data_dir.to_path_buf())
}
