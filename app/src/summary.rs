//! Per-input diagnostics printed as JSON once a run finishes.

use std::path::PathBuf;

use dem_parser::IngestReport;
use pcd_core::crs::CrsInfo;
use serde::Serialize;

use dem_mesh::HeightMode;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    PointCloud(PointCloudSummary),
    Terrain(TerrainSummary),
}

impl Summary {
    pub fn output(&self) -> &PathBuf {
        match self {
            Summary::PointCloud(s) => &s.output,
            Summary::Terrain(s) => &s.output,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortReadSummary {
    pub expected: u64,
    pub decoded: u64,
    pub record_offset: u64,
    pub buffer_len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointCloudSummary {
    pub file: PathBuf,
    pub version: String,
    pub point_format: u8,
    pub declared_points: u64,
    pub decoded_points: usize,
    pub short_read: Option<ShortReadSummary>,
    pub viewer_distance: f64,
    pub lod_tier: usize,
    pub stride: usize,
    pub displayed_points: usize,
    /// World coordinates subtracted from every point.
    pub center: [f64; 3],
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct TerrainSummary {
    pub file: PathBuf,
    pub raster: IngestReport,
    pub crs: Option<CrsInfo>,
    pub height_mode: HeightMode,
    pub exaggeration: f32,
    pub height_scale: f32,
    pub elevation_range: (f32, f32),
    pub vertices: usize,
    pub triangles: usize,
    pub skipped_triangles: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub file: PathBuf,
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub outputs: Vec<Summary>,
    pub failures: Vec<Failure>,
}
