mod config;

pub use config::{Config, CuesConfig, DisplayConfig, SessionConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the config directory.
///
/// `INTERVALRUN_CONFIG_DIR` wins if set; otherwise `~/.config/intervalrun[-dev]/`
/// based on `INTERVALRUN_ENV` (set it to `dev` for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("INTERVALRUN_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("INTERVALRUN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("intervalrun-dev")
            } else {
                base_dir.join("intervalrun")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
