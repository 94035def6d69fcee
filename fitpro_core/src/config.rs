//! Configuration file support for FIT PRO.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitpro/config.toml`.

use crate::session::StoreOptions;
use crate::{Error, Goal, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub nutrition: NutritionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Workout session defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    #[serde(default)]
    pub allow_set_edits: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
            allow_set_edits: false,
        }
    }
}

impl SessionConfig {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            allow_set_edits: self.allow_set_edits,
        }
    }
}

/// Nutrition calculation defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NutritionConfig {
    #[serde(default = "default_activity_level")]
    pub default_activity_level: f64,

    #[serde(default)]
    pub default_goal: Goal,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            default_activity_level: default_activity_level(),
            default_goal: Goal::Default,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fitpro")
}

fn default_rest_seconds() -> u32 {
    60
}

fn default_activity_level() -> f64 {
    1.55
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitpro")
            .join("config.toml")
    }

    /// Reject values the engine and store would refuse later
    pub fn validate(&self) -> Result<()> {
        if self.session.default_rest_seconds == 0 {
            return Err(Error::Config(
                "session.default_rest_seconds must be positive".into(),
            ));
        }
        let level = self.nutrition.default_activity_level;
        if !(level.is_finite() && level > 0.0) {
            return Err(Error::Config(format!(
                "nutrition.default_activity_level must be positive, got {}",
                level
            )));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save the current configuration to a specific path
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Config(format!("config path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.default_rest_seconds, 60);
        assert!(!config.session.allow_set_edits);
        assert_eq!(config.nutrition.default_goal, Goal::Default);
        assert!(config.data.data_dir.ends_with("fitpro"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("fitpro/config.toml");

        let mut config = Config::default();
        config.session.allow_set_edits = true;
        config.nutrition.default_goal = Goal::Hypertrophy;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.session.allow_set_edits);
        assert_eq!(loaded.nutrition.default_goal, Goal::Hypertrophy);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[session]
allow_set_edits = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.session.allow_set_edits);
        assert_eq!(config.session.default_rest_seconds, 60); // default
        assert!(config.session.store_options().allow_set_edits);
        assert!((config.nutrition.default_activity_level - 1.55).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ndefault_rest_seconds = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
