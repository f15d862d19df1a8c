//! Centralized path resolution for idpsync
//!
//! # Environment Variables
//!
//! - `IDPSYNC_CONFIG_DIR` - Override config directory
//! - `IDPSYNC_STATE_DIR` - Override state directory
//!
//! For config_dir():
//! 1. `IDPSYNC_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/idpsync` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\idpsync`
//!    - macOS/Linux: `~/.config/idpsync`
//!
//! For state_dir():
//! 1. `IDPSYNC_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/idpsync` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\idpsync`
//!    - macOS/Linux: `~/.local/state/idpsync`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "IDPSYNC_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "IDPSYNC_STATE_DIR";

const APP_DIR: &str = "idpsync";

/// Get the idpsync config directory path
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
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join(APP_DIR))
}

/// Get the idpsync state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            return Ok(local_app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".local").join("state").join(APP_DIR))
}

/// Default config file (`config.toml` in the config dir)
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default state file (`state.toml` in the state dir)
pub fn state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join("state.toml"))
}

/// Expand ~ and environment variables in a path string.
///
/// ```ignore
/// let path = paths::expand("~/${PROJECT}/idpsync.toml");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
