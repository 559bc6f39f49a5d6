use serde::{Deserialize, Serialize};

/// How raster samples become vertex heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightMode {
    /// `elevation × exaggeration × height_scale`, exaggeration picked from the elevation range.
    #[default]
    Exaggerated,
    /// `elevation × height_scale`; samples are taken as metres.
    Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub height_scale: f32,
    pub height_mode: HeightMode,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            height_scale: 1.0,
            height_mode: HeightMode::Exaggerated,
        }
    }
}

impl TerrainSettings {
    /// Factor applied on top of `height_scale` for an elevation range.
    pub fn exaggeration(&self, range: f32) -> f32 {
        match self.height_mode {
            HeightMode::Exaggerated => exaggeration_for(range),
            HeightMode::Metric => 1.0,
        }
    }
}

/// Flat terrain is stretched so relief stays visible.
pub fn exaggeration_for(range: f32) -> f32 {
    if range < 10.0 {
        10.0
    } else if range < 100.0 {
        5.0
    } else if range < 500.0 {
        2.0
    } else {
        1.0
    }
}
