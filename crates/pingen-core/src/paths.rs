/// Config file location for the CLI
use std::path::PathBuf;

use crate::error::{PingenError, Result};

/// Explicit override for the config file location
pub const CONFIG_PATH_ENV: &str = "PINGEN_CONFIG_PATH";

pub const XDG_CONFIG_HOME_ENV: &str = "XDG_CONFIG_HOME";

// Directory and file names (relative to the config root)
pub const CONFIG_DIR_NAME: &str = "pingen";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Resolve the config file path from the process environment.
///
/// Resolution order:
/// 1. `PINGEN_CONFIG_PATH`
/// 2. `$XDG_CONFIG_HOME/pingen/config.json`
/// 3. `~/.config/pingen/config.json`
pub fn config_path() -> Result<PathBuf> {
    config_path_with(|key| std::env::var(key).ok(), dirs::home_dir)
}

/// Same as [`config_path`] with injectable environment and home lookups
pub fn config_path_with<E, H>(lookup: E, home_dir: H) -> Result<PathBuf>
where
    E: Fn(&str) -> Option<String>,
    H: FnOnce() -> Option<PathBuf>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(explicit) = non_empty(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(explicit));
    }

    let config_root = match non_empty(XDG_CONFIG_HOME_ENV) {
        Some(xdg) => PathBuf::from(xdg),
        None => home_dir()
            .ok_or_else(|| PingenError::Config("failed to resolve config path".to_string()))?
            .join(".config"),
    };

    Ok(config_root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
