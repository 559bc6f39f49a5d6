use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Color {
    /// Each channel divided by 65535, so the result always lies in [0, 1].
    pub fn to_unit_rgb(&self) -> [f32; 3] {
        [
            (self.r as f64 / 65535.0) as f32,
            (self.g as f64 / 65535.0) as f32,
            (self.b as f64 / 65535.0) as f32,
        ]
    }
}

// LAS data coordinates are expressed as scaled i32 integers
// The actual coordinates are calculated based on a combination of scale and offset, as follows
// x = (x * scale[0]) + offset[0]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub color: Option<Color>,
}

// This represents the maximum and minimum values of the original coordinate values obtained by combining the scale and offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    pub fn center(&self) -> [f64; 3] {
        [
            (self.max[0] + self.min[0]) / 2.0,
            (self.max[1] + self.min[1]) / 2.0,
            (self.max[2] + self.min[2]) / 2.0,
        ]
    }

    /// The same box expressed relative to `origin`.
    pub fn translated(&self, origin: [f64; 3]) -> BoundingVolume {
        BoundingVolume {
            min: [
                self.min[0] - origin[0],
                self.min[1] - origin[1],
                self.min[2] - origin[2],
            ],
            max: [
                self.max[0] - origin[0],
                self.max[1] - origin[1],
                self.max[2] - origin[2],
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub point_count: u64,
    pub bounding_volume: BoundingVolume,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

impl Metadata {
    pub fn to_world(&self, record: &PointRecord) -> [f64; 3] {
        [
            record.x as f64 * self.scale[0] + self.offset[0],
            record.y as f64 * self.scale[1] + self.offset[1],
            record.z as f64 * self.scale[2] + self.offset[2],
        ]
    }
}

/// Flat, index-aligned position and color arrays, three floats per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
}

impl PointBuffer {
    pub fn with_capacity(points: usize) -> Self {
        Self {
            positions: Vec::with_capacity(points * 3),
            colors: Vec::with_capacity(points * 3),
        }
    }

    pub fn push(&mut self, position: [f32; 3], color: [f32; 3]) {
        self.positions.extend_from_slice(&position);
        self.colors.extend_from_slice(&color);
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Points that fit before the arrays reallocate.
    pub fn capacity(&self) -> usize {
        self.positions.capacity() / 3
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        self.positions
            .get(index * 3..index * 3 + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        self.colors
            .get(index * 3..index * 3 + 3)
            .map(|c| [c[0], c[1], c[2]])
    }

    pub fn iter(&self) -> impl Iterator<Item = ([f32; 3], [f32; 3])> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.colors.chunks_exact(3))
            .map(|(p, c)| ([p[0], p[1], p[2]], [c[0], c[1], c[2]]))
    }
}

/// Full-resolution cloud re-centred on its bounding-box midpoint.
///
/// Built once per loaded file and never mutated afterwards; level-of-detail
/// sampling only reads from it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPointCloud {
    buffer: PointBuffer,
    center: [f64; 3],
    metadata: Metadata,
}

impl NormalizedPointCloud {
    pub fn new(buffer: PointBuffer, center: [f64; 3], metadata: Metadata) -> Self {
        Self {
            buffer,
            center,
            metadata,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &PointBuffer {
        &self.buffer
    }

    pub fn positions(&self) -> &[f32] {
        self.buffer.positions()
    }

    pub fn colors(&self) -> &[f32] {
        self.buffer.colors()
    }

    /// World-space offset that was subtracted from every point.
    pub fn center(&self) -> [f64; 3] {
        self.center
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Header bounds relative to the recentre offset.
    pub fn local_bounds(&self) -> BoundingVolume {
        self.metadata.bounding_volume.translated(self.center)
    }
}
