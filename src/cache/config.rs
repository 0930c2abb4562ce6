use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Cache size must be at least 1: {0}")]
    ZeroCacheSize(&'static str),
    #[error("Spatial base type must not be empty")]
    EmptyBaseType,
}

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    pub octree_cache_size: usize,
    pub density_cache_size: usize,
    pub reuse_cache_size: usize,
    /// Schema type whose instances (and subtypes) are indexed.
    pub spatial_base_type: String,
}

impl AcceleratorConfig {
    pub fn v0() -> Self {
        Self {
            octree_cache_size: 10_000,
            density_cache_size: 10_000,
            reuse_cache_size: 10_000,
            spatial_base_type: "IfcProduct".into(),
        }
    }

    /// Parse a JSON document. Missing fields take their `v0` values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octree_cache_size == 0 {
            return Err(ConfigError::ZeroCacheSize("octree_cache_size"));
        }
        if self.density_cache_size == 0 {
            return Err(ConfigError::ZeroCacheSize("density_cache_size"));
        }
        if self.reuse_cache_size == 0 {
            return Err(ConfigError::ZeroCacheSize("reuse_cache_size"));
        }
        if self.spatial_base_type.trim().is_empty() {
            return Err(ConfigError::EmptyBaseType);
        }
        Ok(())
    }
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self::v0()
    }
}
