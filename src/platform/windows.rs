// Havenbrowser platform paths for Windows
// Config: %APPDATA%/Havenbrowser
// Data:   %APPDATA%/Havenbrowser

use std::env;
use std::path::PathBuf;

/// Returns the configuration directory for Havenbrowser on Windows.
/// `%APPDATA%/Havenbrowser`
pub fn get_config_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("Havenbrowser")
}

/// Returns the data directory for Havenbrowser on Windows.
/// `%APPDATA%/Havenbrowser`
pub fn get_data_dir() -> PathBuf {
    get_config_dir()
}
