use crate::pointcloud::point::{Metadata, NormalizedPointCloud, PointBuffer, PointRecord};

/// Turns raw scaled-integer records into positions relative to the
/// bounding-box center, with a height ramp for points that carry no color.
#[derive(Debug, Clone)]
pub struct CoordinateNormalizer {
    metadata: Metadata,
    center: [f64; 3],
    // local z bounds, i.e. (minZ - centerZ, maxZ - centerZ)
    z_low: f64,
    z_high: f64,
}

impl CoordinateNormalizer {
    pub fn new(metadata: Metadata) -> Self {
        let center = metadata.bounding_volume.center();
        let z_low = metadata.bounding_volume.min[2] - center[2];
        let z_high = metadata.bounding_volume.max[2] - center[2];
        Self {
            metadata,
            center,
            z_low,
            z_high,
        }
    }

    pub fn center(&self) -> [f64; 3] {
        self.center
    }

    fn local_position(&self, record: &PointRecord) -> [f64; 3] {
        let world = self.metadata.to_world(record);
        [
            world[0] - self.center[0],
            world[1] - self.center[1],
            world[2] - self.center[2],
        ]
    }

    /// (t, 1 - t, 0.5) where t is the clamped height fraction of `z_local`.
    /// A zero-height range yields t = 0.
    pub fn fallback_color(&self, z_local: f64) -> [f32; 3] {
        let range = self.z_high - self.z_low;
        let t = if range != 0.0 && range.is_finite() {
            ((z_local - self.z_low) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        // NaN survives clamp
        let t = if t.is_nan() { 0.0 } else { t };
        [t as f32, (1.0 - t) as f32, 0.5]
    }

    pub fn normalize(&self, record: &PointRecord) -> ([f32; 3], [f32; 3]) {
        let local = self.local_position(record);
        let color = match record.color {
            Some(color) => color.to_unit_rgb(),
            None => self.fallback_color(local[2]),
        };
        (
            [local[0] as f32, local[1] as f32, local[2] as f32],
            color,
        )
    }

    /// Consumes `records` in order; each record is dropped as soon as it has
    /// been written to the output buffer.
    pub fn normalize_all<I>(self, records: I) -> NormalizedPointCloud
    where
        I: IntoIterator<Item = PointRecord>,
    {
        let start = std::time::Instant::now();
        let records = records.into_iter();
        // the header count is only a claim; trust the iterator's bound first
        let (lower, upper) = records.size_hint();
        let capacity = upper
            .unwrap_or(lower)
            .min(usize::try_from(self.metadata.point_count).unwrap_or(usize::MAX));
        let mut buffer = PointBuffer::with_capacity(capacity);
        for record in records {
            let (position, color) = self.normalize(&record);
            buffer.push(position, color);
        }
        log::debug!(
            "normalized {} points around center {:?} in {:?}",
            buffer.len(),
            self.center,
            start.elapsed()
        );
        NormalizedPointCloud::new(buffer, self.center, self.metadata)
    }
}
