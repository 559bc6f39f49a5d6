use std::sync::Arc;

use dem_parser::guard::IngestedRaster;
use pcd_core::cache::BoundedCache;

use crate::builder::{TerrainMesh, TerrainMeshBuilder};
use crate::error::MeshError;
use crate::settings::{HeightMode, TerrainSettings};

pub const DEFAULT_CACHE_CAPACITY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeshKey {
    source: String,
    height_scale_bits: u32,
    height_mode: HeightMode,
}

impl MeshKey {
    fn new(source: &str, settings: &TerrainSettings) -> Self {
        Self {
            source: source.to_string(),
            height_scale_bits: settings.height_scale.to_bits(),
            height_mode: settings.height_mode,
        }
    }
}

/// Builds terrain meshes on demand and keeps a bounded number of them.
///
/// Meshes are keyed by source and height settings, so changing the settings
/// yields freshly built meshes while the old ones age out.
#[derive(Debug)]
pub struct TerrainManager {
    builder: TerrainMeshBuilder,
    cache: BoundedCache<MeshKey, Arc<TerrainMesh>>,
}

impl TerrainManager {
    pub fn new(settings: TerrainSettings, capacity: usize) -> Self {
        Self {
            builder: TerrainMeshBuilder::new(settings),
            cache: BoundedCache::new(capacity),
        }
    }

    pub fn settings(&self) -> &TerrainSettings {
        self.builder.settings()
    }

    pub fn set_settings(&mut self, settings: TerrainSettings) {
        if settings != *self.builder.settings() {
            log::debug!("Terrain settings changed to {:?}", settings);
            self.builder = TerrainMeshBuilder::new(settings);
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn mesh_for(
        &mut self,
        source: &str,
        raster: &IngestedRaster,
    ) -> Result<Arc<TerrainMesh>, MeshError> {
        let key = MeshKey::new(source, self.builder.settings());
        if let Some(mesh) = self.cache.get(&key) {
            log::debug!("Reusing terrain mesh for {}", source);
            return Ok(Arc::clone(mesh));
        }
        let mesh = Arc::new(self.builder.build_ingested(raster)?);
        if let Some((evicted, _)) = self.cache.insert(key, Arc::clone(&mesh)) {
            log::debug!("Dropped cached terrain mesh for {}", evicted.source);
        }
        Ok(mesh)
    }

    /// Forgets every mesh built from `source`, whatever its settings.
    pub fn invalidate(&mut self, source: &str) {
        self.cache.retain(|key| key.source != source);
    }
}

impl Default for TerrainManager {
    fn default() -> Self {
        Self::new(TerrainSettings::default(), DEFAULT_CACHE_CAPACITY)
    }
}
