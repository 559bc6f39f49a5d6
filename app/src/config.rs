//! Run configuration: defaults, an optional JSON file, then CLI flags.

use std::path::Path;

use dem_mesh::manager::DEFAULT_CACHE_CAPACITY;
use dem_mesh::TerrainSettings;
use dem_parser::GuardConfig;
use log::LevelFilter;
use pcd_core::pointcloud::lod::{LodConfig, LodLadder};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    /// Terrain meshes kept in memory at once.
    pub cache_capacity: usize,
    /// Viewer-to-target distance the exported LOD is chosen for.
    pub viewer_distance: f64,
    pub lod: LodConfig,
    pub guard: GuardConfig,
    pub terrain: TerrainSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            viewer_distance: 0.0,
            lod: LodConfig::default(),
            guard: GuardConfig::default(),
            terrain: TerrainSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, overlaid by `cli.config` when given, overlaid by the flags.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(distance) = cli.viewer_distance {
            self.viewer_distance = distance;
        }
        if let Some(scale) = cli.height_scale {
            self.terrain.height_scale = scale;
        }
        if let Some(mode) = cli.height_mode {
            self.terrain.height_mode = mode;
        }
        if let Some(capacity) = cli.cache_capacity {
            self.cache_capacity = capacity;
        }
        if let Some(ref level) = cli.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level_filter()?;
        self.ladder()?;
        self.guard.validate()?;
        if !self.terrain.height_scale.is_finite() {
            return Err(ConfigError::HeightScale(self.terrain.height_scale));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn ladder(&self) -> Result<LodLadder, ConfigError> {
        Ok(self.lod.clone().into_ladder()?)
    }
}
