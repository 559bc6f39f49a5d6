//! Flat vertex buffers handed to a renderer.

use dem_mesh::TerrainMesh;
use pcd_core::pointcloud::decimation::decimator::DisplayedPointCloud;
use serde::Serialize;

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingInfo {
    /// Local (post-recentre) extent of the positions.
    pub min: [f32; 3],
    pub max: [f32; 3],
    /// Offset that was subtracted from world coordinates.
    pub origin: [f64; 3],
}

impl BoundingInfo {
    pub fn of(positions: &[f32], origin: [f64; 3]) -> Self {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in positions.chunks_exact(3) {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        if positions.len() < 3 {
            min = [0.0; 3];
            max = [0.0; 3];
        }
        Self { min, max, origin }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffers {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    /// Triangle indices; `None` renders the vertices as points.
    pub indices: Option<Vec<u32>>,
    pub bounding: BoundingInfo,
}

impl RenderBuffers {
    pub fn from_points(displayed: &DisplayedPointCloud, origin: [f64; 3]) -> Self {
        let positions = displayed.buffer.positions().to_vec();
        let bounding = BoundingInfo::of(&positions, origin);
        Self {
            positions,
            colors: displayed.buffer.colors().to_vec(),
            normals: None,
            indices: None,
            bounding,
        }
    }

    pub fn from_terrain(mesh: &TerrainMesh) -> Self {
        Self {
            bounding: BoundingInfo::of(&mesh.positions, [0.0; 3]),
            positions: mesh.positions.clone(),
            colors: mesh.colors.clone(),
            normals: Some(mesh.normals.clone()),
            indices: Some(mesh.indices.clone()),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_points(&self) -> bool {
        self.indices.is_none()
    }

    /// Checks the attribute arrays line up before anything is encoded.
    pub fn validate(&self) -> Result<(), ExportError> {
        for (attribute, values) in [
            ("positions", Some(&self.positions)),
            ("colors", Some(&self.colors)),
            ("normals", self.normals.as_ref()),
        ] {
            if let Some(values) = values {
                if values.len() % 3 != 0 {
                    return Err(ExportError::NotVec3 {
                        attribute,
                        len: values.len(),
                    });
                }
            }
        }
        let lengths = [
            Some(self.colors.len()),
            self.normals.as_ref().map(Vec::len),
        ];
        for len in lengths.into_iter().flatten() {
            if len != self.positions.len() {
                return Err(ExportError::LengthMismatch {
                    positions: self.vertex_count(),
                    colors: len / 3,
                });
            }
        }
        let vertices = self.vertex_count();
        if let Some(&index) = self
            .indices
            .iter()
            .flatten()
            .find(|&&i| i as usize >= vertices)
        {
            return Err(ExportError::IndexOutOfRange { index, vertices });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_core::pointcloud::point::PointBuffer;

    fn displayed() -> DisplayedPointCloud {
        let mut buffer = PointBuffer::with_capacity(2);
        buffer.push([-1.0, 0.0, 2.0], [1.0, 0.0, 0.0]);
        buffer.push([3.0, -4.0, 0.5], [0.0, 1.0, 0.0]);
        DisplayedPointCloud {
            buffer,
            stride: 1,
            source_count: 2,
        }
    }

    #[test]
    fn point_buffers_carry_bounds_and_origin() {
        let buffers = RenderBuffers::from_points(&displayed(), [10.0, 20.0, 30.0]);
        assert!(buffers.is_points());
        assert_eq!(buffers.vertex_count(), 2);
        assert_eq!(buffers.bounding.min, [-1.0, -4.0, 0.5]);
        assert_eq!(buffers.bounding.max, [3.0, 0.0, 2.0]);
        assert_eq!(buffers.bounding.origin, [10.0, 20.0, 30.0]);
        assert!(buffers.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_indices_and_lengths() {
        let mut buffers = RenderBuffers::from_points(&displayed(), [0.0; 3]);
        buffers.indices = Some(vec![0, 1, 2]);
        assert!(matches!(
            buffers.validate(),
            Err(ExportError::IndexOutOfRange {
                index: 2,
                vertices: 2
            })
        ));

        buffers.indices = None;
        buffers.colors.truncate(3);
        assert!(matches!(
            buffers.validate(),
            Err(ExportError::LengthMismatch {
                positions: 2,
                colors: 1
            })
        ));

        buffers.positions.push(1.0);
        assert!(matches!(
            buffers.validate(),
            Err(ExportError::NotVec3 {
                attribute: "positions",
                len: 7
            })
        ));
    }

    #[test]
    fn empty_bounds_are_zero() {
        let info = BoundingInfo::of(&[], [1.0; 3]);
        assert_eq!(info.min, [0.0; 3]);
        assert_eq!(info.max, [0.0; 3]);
    }
}
