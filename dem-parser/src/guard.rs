//! Resolution cap for rasters on their way to the mesh builder.

use serde::{Deserialize, Serialize};

use crate::error::{GuardConfigError, IngestError};
use crate::grid::ElevationGrid;
use crate::normalize::{
    default_sentinels, elevation_stats, normalize_elevations, ElevationStats, NoDataFilter,
};
use crate::source::{RasterSource, ResampleMethod};

/// Rasters with more than `min_pixels` pixels are capped at `max_dimension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTier {
    pub min_pixels: u64,
    pub max_dimension: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub resolution_tiers: Vec<ResolutionTier>,
    /// Cap for rasters below every tier.
    pub default_max_dimension: u32,
    pub emergency_dimension: u32,
    pub no_data_sentinels: Vec<f32>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            resolution_tiers: vec![
                ResolutionTier {
                    min_pixels: 100_000_000,
                    max_dimension: 512,
                },
                ResolutionTier {
                    min_pixels: 25_000_000,
                    max_dimension: 1024,
                },
                ResolutionTier {
                    min_pixels: 4_000_000,
                    max_dimension: 2048,
                },
            ],
            default_max_dimension: 4096,
            emergency_dimension: 256,
            no_data_sentinels: default_sentinels(),
        }
    }
}

impl GuardConfig {
    /// The most restrictive cap whose threshold `pixel_count` exceeds.
    pub fn max_dimension_for(&self, pixel_count: u64) -> u32 {
        self.resolution_tiers
            .iter()
            .filter(|tier| pixel_count > tier.min_pixels)
            .map(|tier| tier.max_dimension)
            .min()
            .unwrap_or(self.default_max_dimension)
    }

    pub fn validate(&self) -> Result<(), GuardConfigError> {
        let zero = |field: String| Err(GuardConfigError::ZeroDimension { field });
        if self.default_max_dimension == 0 {
            return zero("default_max_dimension".to_string());
        }
        if self.emergency_dimension == 0 {
            return zero("emergency_dimension".to_string());
        }
        if let Some(index) = self
            .resolution_tiers
            .iter()
            .position(|tier| tier.max_dimension == 0)
        {
            return zero(format!("resolution_tiers[{index}].max_dimension"));
        }
        Ok(())
    }
}

/// Dimensions fitting `(width, height)` under `max_dimension`, with the scale applied.
///
/// A zero cap is treated as 1.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> ((u32, u32), f64) {
    let max_dimension = max_dimension.max(1);
    let largest = width.max(height);
    if largest <= max_dimension || largest == 0 {
        return ((width, height), 1.0);
    }
    let scale = max_dimension as f64 / largest as f64;
    let fit = |d: u32| ((d as f64 * scale).round() as u32).clamp(1, max_dimension);
    ((fit(width), fit(height)), scale)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub original_width: u32,
    pub original_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub pixel_count: u64,
    pub max_dimension: u32,
    pub scale_factor: f64,
    pub emergency: bool,
    pub epsg: Option<u16>,
    pub stats: ElevationStats,
}

#[derive(Debug, Clone)]
pub struct IngestedRaster {
    pub grid: ElevationGrid,
    /// Samples mapped to [0, 1], index-aligned with the grid.
    pub normalized: Vec<f32>,
    pub no_data: NoDataFilter,
    pub report: IngestReport,
}

#[derive(Debug, Clone, Default)]
pub struct RasterIngestGuard {
    config: GuardConfig,
}

impl RasterIngestGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn ingest(&self, source: &dyn RasterSource) -> Result<IngestedRaster, IngestError> {
        let (width, height) = (source.width(), source.height());
        if width == 0 || height == 0 {
            return Err(IngestError::Empty { width, height });
        }

        let pixel_count = source.pixel_count();
        let max_dimension = self.config.max_dimension_for(pixel_count);
        let ((mut target_width, mut target_height), mut scale_factor) =
            fit_dimensions(width, height, max_dimension);
        let mut target = (scale_factor < 1.0).then_some((target_width, target_height));
        if target.is_some() {
            log::info!(
                "Raster {}x{} ({} px) exceeds {}px; resampling to {}x{}",
                width,
                height,
                pixel_count,
                max_dimension,
                target_width,
                target_height
            );
        }

        let mut emergency = false;
        let samples = match source.read_samples(target, ResampleMethod::Nearest) {
            Ok(samples) => samples,
            Err(e) if e.is_resource_exhausted() => {
                let dimension = self.config.emergency_dimension;
                log::warn!("{}; retrying once at {}px", e, dimension);
                let ((w, h), scale) = fit_dimensions(width, height, dimension);
                (target_width, target_height, scale_factor) = (w, h, scale);
                target = Some((w, h));
                emergency = true;
                source
                    .read_samples(target, ResampleMethod::Nearest)
                    .map_err(|source| IngestError::TooLarge {
                        width,
                        height,
                        emergency: dimension,
                        source,
                    })?
            }
            Err(e) => return Err(e.into()),
        };

        let rgb = match source.read_rgb(target) {
            Ok(rgb) => rgb,
            Err(e) => {
                log::warn!("Ignoring raster colour bands: {}", e);
                None
            }
        };

        let mut grid =
            ElevationGrid::new(target_width, target_height, samples, source.bounds());
        if let Some(rgb) = rgb {
            grid = grid.with_rgb(rgb);
        }

        let no_data = NoDataFilter::new(self.config.no_data_sentinels.iter().copied())
            .with_raster_value(source.no_data());
        let stats = elevation_stats(grid.samples(), &no_data);
        let normalized = normalize_elevations(grid.samples(), &stats, &no_data);

        log::debug!(
            "Ingested raster {}x{} -> {}x{} (scale {:.4}, elevation {}..{})",
            width,
            height,
            target_width,
            target_height,
            scale_factor,
            stats.min,
            stats.max
        );

        Ok(IngestedRaster {
            grid,
            normalized,
            no_data,
            report: IngestReport {
                original_width: width,
                original_height: height,
                target_width,
                target_height,
                pixel_count,
                max_dimension,
                scale_factor,
                emergency,
                epsg: source.epsg(),
                stats,
            },
        })
    }
}
