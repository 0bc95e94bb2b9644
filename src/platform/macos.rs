// Havenbrowser platform paths for macOS
// Config: ~/Library/Application Support/Havenbrowser
// Data:   ~/Library/Application Support/Havenbrowser

use std::env;
use std::path::PathBuf;

/// Returns the configuration directory for Havenbrowser on macOS.
/// `~/Library/Application Support/Havenbrowser`
pub fn get_config_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
    PathBuf::from(home)
        .join("Library")
        .join("Application Support")
        .join("Havenbrowser")
}

/// Returns the data directory for Havenbrowser on macOS.
/// Same as the config directory: `~/Library/Application Support/Havenbrowser`
pub fn get_data_dir() -> PathBuf {
    get_config_dir()
}
