use crate::pointcloud::point::{NormalizedPointCloud, PointBuffer};

/// Reduced copy of a cloud, as handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedPointCloud {
    pub buffer: PointBuffer,
    pub stride: usize,
    pub source_count: usize,
}

impl DisplayedPointCloud {
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

pub trait PointCloudDecimator {
    fn decimate(&self, cloud: &NormalizedPointCloud) -> DisplayedPointCloud;
}

/// Uniform deterministic decimation: every `stride`-th point starting at 0.
pub struct StrideDecimator {
    pub point_budget: u64,
}

impl StrideDecimator {
    /// `max(1, floor(point_count / point_budget))`; a zero budget counts as one.
    pub fn stride_for(point_count: usize, point_budget: u64) -> usize {
        let budget = usize::try_from(point_budget.max(1)).unwrap_or(usize::MAX);
        (point_count / budget).max(1)
    }

    /// Number of points kept for a given stride, `floor(point_count / stride)`.
    pub fn sampled_count(point_count: usize, point_budget: u64) -> usize {
        point_count / Self::stride_for(point_count, point_budget)
    }
}

impl PointCloudDecimator for StrideDecimator {
    fn decimate(&self, cloud: &NormalizedPointCloud) -> DisplayedPointCloud {
        let source = cloud.buffer();
        let point_count = source.len();
        let stride = Self::stride_for(point_count, self.point_budget);
        let sampled = point_count / stride;

        let mut buffer = PointBuffer::with_capacity(sampled);
        for (position, color) in source.iter().step_by(stride).take(sampled) {
            buffer.push(position, color);
        }

        DisplayedPointCloud {
            buffer,
            stride,
            source_count: point_count,
        }
    }
}
