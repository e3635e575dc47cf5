//! Application settings.
//!
//! Values come from, highest priority first:
//! 1. `NIFTY_DB` / `NIFTY_HOTKEY` environment variables
//! 2. a JSON file (`NIFTY_CONFIG`, or `nifty.json` in the working directory)
//! 3. built-in defaults
//!
//! A missing file is fine; a file that exists but cannot be read or parsed is an error.

use crate::error::{NiftyError, Result};
use crate::hotkey::KeyCombo;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "nifty.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// Quick-add combination, e.g. `<ctrl>+<shift>+s`.
    pub hotkey: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("learning_items.db"),
            hotkey: "<ctrl>+<shift>+s".to_string(),
            window_width: 600.0,
            window_height: 400.0,
        }
    }
}

impl Config {
    /// Loads the config using the file and environment lookup described above.
    pub fn load() -> Result<Self> {
        let path = env::var_os("NIFTY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let mut config = Self::load_file(&path)?.unwrap_or_default();
        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file. Returns `Ok(None)` when it does not exist.
    pub fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            NiftyError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&contents).map_err(|e| {
            NiftyError::config(format!("invalid config in {}: {}", path.display(), e))
        })?;

        log::info!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup("NIFTY_DB").filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(hotkey) = lookup("NIFTY_HOTKEY").filter(|v| !v.trim().is_empty()) {
            self.hotkey = hotkey;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(NiftyError::config("database_path must not be empty"));
        }
        if !(self.window_width > 0.0 && self.window_height > 0.0) {
            return Err(NiftyError::config("window size must be positive"));
        }
        self.key_combo()?;
        Ok(())
    }

    pub fn key_combo(&self) -> Result<KeyCombo> {
        self.hotkey.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Modifier;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database_path, PathBuf::from("learning_items.db"));
        assert_eq!(config.hotkey, "<ctrl>+<shift>+s");
        assert!(config.validate().is_ok());

        let combo = config.key_combo().unwrap();
        assert_eq!(combo.key(), 's');
        assert!(combo.modifiers().contains(&Modifier::Shift));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_file(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "database_path": "/tmp/review.db" }"#).unwrap();

        let config = Config::load_file(&path).unwrap().unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/review.db"));
        assert_eq!(config.hotkey, Config::default().hotkey);
        assert_eq!(config.window_width, 600.0);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let result = Config::load_file(&path);
        assert!(matches!(result, Err(NiftyError::Config { .. })));
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let env: HashMap<&str, &str> =
            HashMap::from([("NIFTY_DB", "override.db"), ("NIFTY_HOTKEY", "alt+r")]);
        let mut config = Config::default();

        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("override.db"));
        assert_eq!(config.hotkey, "alt+r");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_hotkey() {
        let config = Config {
            hotkey: "<ctrl>+<shift>".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(NiftyError::Hotkey { .. })));
    }
}
