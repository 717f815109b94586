//! Path resolution for conform
//!
//! # Environment Variables
//!
//! - `CONFORM_CONFIG_DIR` - Override config directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CONFORM_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/conform` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\conform`
//!    - macOS/Linux: `~/.config/conform`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CONFORM_CONFIG_DIR";

/// Get the conform config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("conform");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("conform");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("conform");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string
///
/// Unknown variables are left as written; the tilde is expanded regardless.
pub fn expand(path: &str) -> PathBuf {
    let tilded = shellexpand::tilde(path);
    match shellexpand::full(tilded.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::debug!("Leaving variables in {path} unexpanded: {e}");
            PathBuf::from(tilded.as_ref())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
