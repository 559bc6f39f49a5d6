//! Drives one input at a time from file to GLB.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dem_mesh::TerrainManager;
use dem_parser::geotiff::GeoTiffRaster;
use dem_parser::RasterIngestGuard;
use pcd_core::crs;
use pcd_core::pointcloud::lod::{CameraPose, LodLadder, LodManager, LodState};
use pcd_exporter::{write_glb_file, RenderBuffers};
use pcd_parser::parsers::las::LasFileParser;
use pcd_parser::parsers::Parser as _;

use crate::config::AppConfig;
use crate::error::{ConfigError, PipelineError};
use crate::input::InputKind;
use crate::summary::{
    Failure, PointCloudSummary, RunSummary, ShortReadSummary, Summary, TerrainSummary,
};

pub struct Pipeline {
    config: AppConfig,
    ladder: LodLadder,
    guard: RasterIngestGuard,
    terrain: TerrainManager,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ladder = config.ladder()?;
        let guard = RasterIngestGuard::new(config.guard.clone());
        let terrain = TerrainManager::new(config.terrain, config.cache_capacity);
        Ok(Self {
            config,
            ladder,
            guard,
            terrain,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Processes `inputs` in order. A failing input is logged and recorded;
    /// the rest still run.
    pub fn run(&mut self, inputs: &[PathBuf], output_dir: &Path) -> Result<RunSummary, PipelineError> {
        std::fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut summary = RunSummary::default();
        for input in inputs {
            let start = std::time::Instant::now();
            match self.process(input, output_dir) {
                Ok(done) => {
                    log::info!(
                        "Wrote {} from {} in {:?}",
                        done.output().display(),
                        input.display(),
                        start.elapsed()
                    );
                    summary.outputs.push(done);
                }
                Err(e) => {
                    log::error!("{} ({}): {}", input.display(), e.kind(), e);
                    summary.failures.push(Failure {
                        file: input.clone(),
                        kind: e.kind().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(summary)
    }

    pub fn process(&mut self, input: &Path, output_dir: &Path) -> Result<Summary, PipelineError> {
        let output = output_path(input, output_dir);
        match InputKind::from_path(input)? {
            InputKind::Las => self.process_las(input, output).map(Summary::PointCloud),
            InputKind::GeoTiff => self.process_geotiff(input, output).map(Summary::Terrain),
        }
    }

    fn process_las(&self, input: &Path, output: PathBuf) -> Result<PointCloudSummary, PipelineError> {
        log::info!("Loading point cloud {}", input.display());
        let parsed = LasFileParser {
            filename: input.to_path_buf(),
        }
        .parse()?;
        if parsed.cloud.is_empty() {
            return Err(PipelineError::EmptyCloud {
                path: input.to_path_buf(),
            });
        }

        let header = parsed.header;
        let cloud = Arc::new(parsed.cloud);
        let center = cloud.center();
        let manager = LodManager::new(self.ladder.clone(), Arc::clone(&cloud));
        let camera = CameraPose {
            position: [0.0, 0.0, self.config.viewer_distance],
            target: [0.0; 3],
        };
        let state = manager.update(LodState::default(), &camera);
        let (Some(tier), Some(displayed)) = (state.active_tier(), state.displayed()) else {
            return Err(PipelineError::EmptyCloud {
                path: input.to_path_buf(),
            });
        };

        let buffers = RenderBuffers::from_points(displayed, center);
        write_glb_file(&output, &buffers)?;

        Ok(PointCloudSummary {
            file: input.to_path_buf(),
            version: format!("{}.{}", header.version.0, header.version.1),
            point_format: header.point_format.code(),
            declared_points: header.point_count,
            decoded_points: cloud.len(),
            short_read: parsed.short_read.map(|s| ShortReadSummary {
                expected: s.expected,
                decoded: s.decoded,
                record_offset: s.record_offset,
                buffer_len: s.buffer_len,
            }),
            viewer_distance: camera.distance(),
            lod_tier: tier,
            stride: displayed.stride,
            displayed_points: displayed.len(),
            center,
            output,
        })
    }

    fn process_geotiff(
        &mut self,
        input: &Path,
        output: PathBuf,
    ) -> Result<TerrainSummary, PipelineError> {
        log::info!("Loading elevation raster {}", input.display());
        let raster = GeoTiffRaster::open(input)?;
        let ingested = self.guard.ingest(&raster)?;
        let mesh = self
            .terrain
            .mesh_for(&input.to_string_lossy(), &ingested)?;

        let buffers = RenderBuffers::from_terrain(&mesh);
        write_glb_file(&output, &buffers)?;

        let report = ingested.report;
        Ok(TerrainSummary {
            file: input.to_path_buf(),
            crs: report.epsg.and_then(crs::lookup).copied(),
            raster: report,
            height_mode: mesh.height_mode,
            exaggeration: mesh.exaggeration,
            height_scale: mesh.height_scale,
            elevation_range: mesh.elevation_range,
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
            skipped_triangles: mesh.skipped_triangles,
            output,
        })
    }
}

/// `<output_dir>/<file name with .glb>`.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{stem}.glb"))
}
