//! Triangulated terrain from an elevation grid.

use std::time::Instant;

use dem_parser::grid::{ElevationGrid, GeoBounds, RgbBands};
use dem_parser::guard::IngestedRaster;
use dem_parser::normalize::{NoDataFilter, DEFAULT_RANGE};

use crate::color::{ramp, NEUTRAL_GRAY};
use crate::error::MeshError;
use crate::settings::{HeightMode, TerrainSettings};

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    /// x, y, z per vertex; centred on the origin in X/Z with the lowest point at Y = 0.
    pub positions: Vec<f32>,
    /// r, g, b in [0, 1] per vertex.
    pub colors: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub width: u32,
    pub height: u32,
    pub exaggeration: f32,
    pub height_scale: f32,
    pub height_mode: HeightMode,
    pub elevation_range: (f32, f32),
    pub skipped_triangles: usize,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of the vertex positions.
    pub fn local_bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in self.positions.chunks_exact(3) {
            for axis in 0..3 {
                if p[axis] < min[axis] {
                    min[axis] = p[axis];
                }
                if p[axis] > max[axis] {
                    max[axis] = p[axis];
                }
            }
        }
        (min, max)
    }
}

/// Min/max of the valid samples in one plain loop.
pub fn elevation_range(samples: &[f32], no_data: &NoDataFilter) -> Option<(f32, f32)> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut found = false;
    for &v in samples {
        if no_data.is_no_data(v) {
            continue;
        }
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
        found = true;
    }
    found.then_some((min, max))
}

/// Maps a grid cell onto the X/Z plane, centred on the origin.
struct PlanarMapping {
    step_x: f64,
    step_z: f64,
    half_x: f64,
    half_z: f64,
}

impl PlanarMapping {
    fn new(width: u32, height: u32, bounds: GeoBounds) -> Self {
        let (cols, rows) = ((width - 1) as f64, (height - 1) as f64);
        let (span_x, span_z) = if bounds.is_degenerate() {
            (cols, rows)
        } else {
            (bounds.width(), bounds.height())
        };
        Self {
            step_x: span_x / cols,
            step_z: span_z / rows,
            half_x: span_x / 2.0,
            half_z: span_z / 2.0,
        }
    }

    /// Row 0 is the northern edge and lies towards -Z.
    fn map(&self, col: u32, row: u32) -> (f32, f32) {
        (
            (col as f64 * self.step_x - self.half_x) as f32,
            (row as f64 * self.step_z - self.half_z) as f32,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TerrainMeshBuilder {
    settings: TerrainSettings,
}

impl TerrainMeshBuilder {
    pub fn new(settings: TerrainSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Colours follow the raster's normalised elevations.
    pub fn build_ingested(&self, raster: &IngestedRaster) -> Result<TerrainMesh, MeshError> {
        let grid = &raster.grid;
        self.assemble(
            grid.samples(),
            grid.width(),
            grid.height(),
            grid.bounds(),
            grid.rgb(),
            &raster.no_data,
            Some(raster.normalized.as_slice()),
        )
    }

    pub fn build(
        &self,
        grid: &ElevationGrid,
        no_data: &NoDataFilter,
    ) -> Result<TerrainMesh, MeshError> {
        self.build_samples(
            grid.samples(),
            grid.width(),
            grid.height(),
            grid.bounds(),
            grid.rgb(),
            no_data,
        )
    }

    /// Builds from a raw row-major array that may hold fewer than
    /// `width * height` samples; cells touching missing vertices are skipped.
    pub fn build_samples(
        &self,
        samples: &[f32],
        width: u32,
        height: u32,
        bounds: GeoBounds,
        rgb: Option<&RgbBands>,
        no_data: &NoDataFilter,
    ) -> Result<TerrainMesh, MeshError> {
        self.assemble(samples, width, height, bounds, rgb, no_data, None)
    }

    /// `fractions`, when given, are the ramp parameters per vertex.
    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        samples: &[f32],
        width: u32,
        height: u32,
        bounds: GeoBounds,
        rgb: Option<&RgbBands>,
        no_data: &NoDataFilter,
        fractions: Option<&[f32]>,
    ) -> Result<TerrainMesh, MeshError> {
        let start = Instant::now();
        if width < 2 || height < 2 {
            return Err(MeshError::TooSmall { width, height });
        }
        let cells = width as u64 * height as u64;
        if cells > u32::MAX as u64 {
            return Err(MeshError::TooManyVertices { vertices: cells });
        }
        let height_scale = self.settings.height_scale;
        if !height_scale.is_finite() {
            return Err(MeshError::InvalidHeightScale(height_scale));
        }

        let (min, max) = elevation_range(samples, no_data).unwrap_or_else(|| {
            log::warn!(
                "No valid elevation samples; colouring with range {:?}",
                DEFAULT_RANGE
            );
            DEFAULT_RANGE
        });
        let range = max - min;
        let exaggeration = self.settings.exaggeration(range);
        let vertical = exaggeration * height_scale;

        let vertex_count = samples.len().min(cells as usize);
        let mapping = PlanarMapping::new(width, height, bounds);
        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut colors = Vec::with_capacity(vertex_count * 3);
        let mut padded = 0usize;

        for (i, &value) in samples[..vertex_count].iter().enumerate() {
            let (col, row) = ((i % width as usize) as u32, (i / width as usize) as u32);
            let missing = no_data.is_no_data(value);
            let elevation = if missing { min } else { value };
            let (x, z) = mapping.map(col, row);
            positions.extend_from_slice(&[x, elevation * vertical, z]);

            let color = match rgb {
                Some(bands) => bands.unit_rgb(i).unwrap_or_else(|| {
                    padded += 1;
                    NEUTRAL_GRAY
                }),
                None => {
                    let t = if let Some(&t) = fractions.and_then(|f| f.get(i)) {
                        t
                    } else if missing {
                        0.0
                    } else if range == 0.0 {
                        0.5
                    } else {
                        (value - min) / range
                    };
                    ramp(t)
                }
            };
            colors.extend_from_slice(&color);
        }
        if padded > 0 {
            log::warn!(
                "Colour bands cover {} of {} vertices; padded the rest with gray",
                vertex_count - padded,
                vertex_count
            );
        }

        let (indices, skipped_triangles) = triangulate(width, height, vertex_count);
        if skipped_triangles > 0 {
            log::warn!(
                "Skipped {} triangles referencing vertices past {}",
                skipped_triangles,
                vertex_count
            );
        }

        ground(&mut positions);
        let normals = vertex_normals(&positions, &indices);

        log::debug!(
            "Built terrain mesh {}x{}: {} vertices, {} triangles, exaggeration x{} in {:?}",
            width,
            height,
            vertex_count,
            indices.len() / 3,
            exaggeration,
            start.elapsed()
        );

        Ok(TerrainMesh {
            positions,
            colors,
            normals,
            indices,
            width,
            height,
            exaggeration,
            height_scale,
            height_mode: self.settings.height_mode,
            elevation_range: (min, max),
            skipped_triangles,
        })
    }
}

/// Two triangles per 2x2 block: (tl, tr, bl) then (tr, br, bl).
fn triangulate(width: u32, height: u32, vertex_count: usize) -> (Vec<u32>, usize) {
    let w = width as usize;
    let mut indices = Vec::with_capacity((w - 1) * (height as usize - 1) * 6);
    let mut skipped = 0;
    for row in 0..height as usize - 1 {
        for col in 0..w - 1 {
            let tl = row * w + col;
            let tr = tl + 1;
            let bl = tl + w;
            let br = bl + 1;
            for tri in [[tl, tr, bl], [tr, br, bl]] {
                if tri.iter().any(|&i| i >= vertex_count) {
                    skipped += 1;
                    continue;
                }
                indices.extend(tri.iter().map(|&i| i as u32));
            }
        }
    }
    (indices, skipped)
}

/// Shifts every vertex so the lowest one sits at Y = 0.
fn ground(positions: &mut [f32]) {
    let mut lowest = f32::INFINITY;
    for p in positions.chunks_exact(3) {
        if p[1] < lowest {
            lowest = p[1];
        }
    }
    if !lowest.is_finite() {
        return;
    }
    for p in positions.chunks_exact_mut(3) {
        p[1] -= lowest;
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Area-weighted vertex normals, oriented to face +Y on flat ground.
fn vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex = |i: u32| {
        let at = i as usize * 3;
        [positions[at], positions[at + 1], positions[at + 2]]
    };
    let mut normals = vec![0.0f32; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
        // the winding runs clockwise seen from above
        let face = cross(sub(c, a), sub(b, a));
        for &i in tri {
            let at = i as usize * 3;
            normals[at] += face[0];
            normals[at + 1] += face[1];
            normals[at + 2] += face[2];
        }
    }
    for n in normals.chunks_exact_mut(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > 0.0 && len.is_finite() {
            n[0] /= len;
            n[1] /= len;
            n[2] /= len;
        } else {
            n.copy_from_slice(&[0.0, 1.0, 0.0]);
        }
    }
    normals
}
