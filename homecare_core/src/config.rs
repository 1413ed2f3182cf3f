//! Configuration file support for homecare.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/homecare/config.toml`.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Deserialize)]
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

/// Local storage key layout
#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    /// Namespace prepended to every storage key (`<prefix>_bookings`)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

impl StorageConfig {
    pub fn bookings_key(&self) -> String {
        format!("{}_bookings", self.key_prefix)
    }

    pub fn session_key(&self) -> String {
        format!("{}_user", self.key_prefix)
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("homecare")
}

fn default_key_prefix() -> String {
    "healthApp".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
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
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("homecare").join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        let prefix = &self.storage.key_prefix;
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "storage.key_prefix '{}' must be non-empty and use only [A-Za-z0-9_-]",
                prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.key_prefix, "healthApp");
        assert_eq!(config.storage.bookings_key(), "healthApp_bookings");
        assert_eq!(config.storage.session_key(), "healthApp_user");
        assert!(config.data.data_dir.ends_with("homecare"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let data_dir = temp_dir.path().join("data");
        std::fs::write(
            &path,
            format!("[data]\ndata_dir = {:?}\n", data_dir.display().to_string()),
        )
        .unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.data.data_dir, data_dir);
        assert_eq!(parsed.storage.key_prefix, "healthApp");
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[storage]
key_prefix = "demo"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.bookings_key(), "demo_bookings");
        assert!(config.data.data_dir.ends_with("homecare")); // default
    }

    #[test]
    fn test_rejects_path_like_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nkey_prefix = \"../evil\"\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
