// Havenbrowser Settings Engine
// Manages user settings: loading, saving, updating individual values, and resetting to defaults.
// Settings are stored as a JSON file at the platform-specific config path.

use std::fs;
use std::path::Path;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::BrowserSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<BrowserSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &BrowserSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: BrowserSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => {
                let config_dir = platform::get_config_dir();
                config_dir
                    .join("settings.json")
                    .to_string_lossy()
                    .to_string()
            }
        };

        Self {
            config_path,
            settings: BrowserSettings::default(),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<BrowserSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = BrowserSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: BrowserSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Returns a reference to the current in-memory settings.
    fn get_settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path.
    ///
    /// Converts the current settings to a `serde_json::Value`, navigates the
    /// dot-separated key path, updates the target value, then deserializes
    /// back into `BrowserSettings`. Saves to disk after a successful update.
    ///
    /// # Examples
    /// - `"general.restore_tabs"` → updates `settings.general.restore_tabs`
    /// - `"supervisor.max_restart_attempts"` → updates `settings.supervisor.max_restart_attempts`
    /// - `"session.restore_delay_ms"` → updates `settings.session.restore_delay_ms`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let parts: Vec<&str> = key.split('.').collect();

        // Serialize current settings to a JSON Value
        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        // Navigate to the target location and set the value
        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                if i == parts.len() - 1 {
                    // Last part — set the value
                    match current {
                        serde_json::Value::Object(map) => {
                            if !map.contains_key(*part) {
                                return Err(SettingsError::InvalidKey(format!(
                                    "Key '{}' not found in settings",
                                    key
                                )));
                            }
                            map.insert(part.to_string(), value.clone());
                        }
                        _ => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Cannot navigate to key '{}': intermediate value is not an object",
                                key
                            )));
                        }
                    }
                } else {
                    // Intermediate part — navigate deeper
                    current = match current.get_mut(*part) {
                        Some(v) => v,
                        None => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Key '{}' not found in settings",
                                key
                            )));
                        }
                    };
                }
            }
        }

        // Deserialize back into BrowserSettings to validate the new value
        let new_settings: BrowserSettings =
            serde_json::from_value(json_value).map_err(|e| {
                SettingsError::InvalidValue(format!(
                    "Invalid value for key '{}': {}",
                    key, e
                ))
            })?;

        self.settings = new_settings;

        // Persist to disk
        self.save()?;

        Ok(())
    }

    /// Resets all settings to factory defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = BrowserSettings::default();
        self.save()?;
        Ok(())
    }

    /// Returns the path to the config file.
    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
