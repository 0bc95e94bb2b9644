// Havenbrowser platform paths for Linux
// Config: ~/.config/havenbrowser
// Data:   ~/.local/share/havenbrowser

use std::env;
use std::path::PathBuf;

/// Returns the configuration directory for Havenbrowser on Linux.
/// Uses `$XDG_CONFIG_HOME/havenbrowser` if set, otherwise `~/.config/havenbrowser`.
pub fn get_config_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("havenbrowser")
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home).join(".config").join("havenbrowser")
    }
}

/// Returns the data directory for Havenbrowser on Linux.
/// Uses `$XDG_DATA_HOME/havenbrowser` if set, otherwise `~/.local/share/havenbrowser`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("havenbrowser")
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("havenbrowser")
    }
}
