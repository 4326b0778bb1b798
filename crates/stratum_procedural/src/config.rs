//! Startup configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::chunk::{CHUNK_SIZE, DEFAULT_REGION_SIZE};
use crate::error::{ConfigError, ConfigResult};

/// Streaming configuration, read once at startup.
///
/// Every key is optional in TOML:
///
/// ```toml
/// world_seed = 42
/// rendering_distance = 6
/// storage_dir = "saves/regions"
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StratumConfig {
    /// World seed. `None` picks a random one at startup.
    pub world_seed: Option<i64>,
    /// Window radius in chunks.
    pub rendering_distance: u32,
    /// Region edge in tiles.
    pub region_size: u32,
    /// Directory for region files.
    pub storage_dir: PathBuf,
    /// Background worker threads.
    pub worker_count: usize,
    /// Loads handed to workers per streamer tick.
    pub max_loads_per_tick: usize,
}

impl Default for StratumConfig {
    fn default() -> Self {
        Self {
            world_seed: None,
            rendering_distance: 4,
            region_size: DEFAULT_REGION_SIZE as u32,
            storage_dir: PathBuf::from("regions"),
            worker_count: 2,
            max_loads_per_tick: 8,
        }
    }
}

impl StratumConfig {
    /// Small, fast settings for tests: 64-tile regions in a fresh temp
    /// directory.
    #[must_use]
    pub fn test() -> Self {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        Self {
            world_seed: Some(42),
            rendering_distance: 2,
            region_size: 64,
            storage_dir: std::env::temp_dir().join(format!("stratum_test_{id}")),
            worker_count: 2,
            max_loads_per_tick: 64,
        }
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for bad TOML, or any validation error.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`StratumConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every rule.
    ///
    /// # Errors
    ///
    /// The first rule violated.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rendering_distance < 1 {
            return Err(ConfigError::InvalidRadius(self.rendering_distance));
        }
        let chunk = CHUNK_SIZE as u32;
        if self.region_size == 0 || self.region_size % chunk != 0 {
            return Err(ConfigError::InvalidRegionSize {
                size: self.region_size,
                chunk,
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.max_loads_per_tick == 0 {
            return Err(ConfigError::NoLoadsPerTick);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = StratumConfig::from_toml_str("").unwrap();
        assert_eq!(config, StratumConfig::default());
        assert_eq!(config.region_size, 512);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = StratumConfig::from_toml_str(
            "world_seed = -7\nrendering_distance = 6\nstorage_dir = \"saves\"\n",
        )
        .unwrap();
        assert_eq!(config.world_seed, Some(-7));
        assert_eq!(config.rendering_distance, 6);
        assert_eq!(config.storage_dir, PathBuf::from("saves"));
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            StratumConfig::from_toml_str("rendering_distance = 0"),
            Err(ConfigError::InvalidRadius(0))
        ));
        assert!(matches!(
            StratumConfig::from_toml_str("region_size = 500"),
            Err(ConfigError::InvalidRegionSize { size: 500, chunk: 16 })
        ));
        assert!(matches!(
            StratumConfig::from_toml_str("region_size = 0"),
            Err(ConfigError::InvalidRegionSize { .. })
        ));
        assert!(matches!(
            StratumConfig::from_toml_str("worker_count = 0"),
            Err(ConfigError::NoWorkers)
        ));
        assert!(matches!(
            StratumConfig::from_toml_str("max_loads_per_tick = 0"),
            Err(ConfigError::NoLoadsPerTick)
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            StratumConfig::from_toml_str("world_seed = \"forty-two\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StratumConfig::from_toml_str("render_distance = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("stratum_no_such_config.toml");
        assert!(matches!(
            StratumConfig::from_file(&path),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_preset_is_valid() {
        StratumConfig::test().validate().unwrap();
    }
}
