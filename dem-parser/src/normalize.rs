//! Elevation statistics and [0, 1] normalisation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Samples scanned per parallel work item.
pub const STATS_CHUNK: usize = 64 * 1024;

/// Range assumed when a raster holds no valid sample.
pub const DEFAULT_RANGE: (f32, f32) = (0.0, 100.0);

pub fn default_sentinels() -> Vec<f32> {
    vec![-9999.0, -32768.0, 0.0]
}

/// Decides which samples carry no measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct NoDataFilter {
    sentinels: Vec<f32>,
}

impl NoDataFilter {
    pub fn new(sentinels: impl IntoIterator<Item = f32>) -> Self {
        Self {
            sentinels: sentinels.into_iter().filter(|v| !v.is_nan()).collect(),
        }
    }

    /// Adds the raster's own no-data value, if it declares one.
    pub fn with_raster_value(mut self, value: Option<f32>) -> Self {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            if !self.sentinels.contains(&v) {
                self.sentinels.push(v);
            }
        }
        self
    }

    pub fn sentinels(&self) -> &[f32] {
        &self.sentinels
    }

    pub fn is_no_data(&self, value: f32) -> bool {
        !value.is_finite() || self.sentinels.contains(&value)
    }
}

impl Default for NoDataFilter {
    fn default() -> Self {
        Self::new(default_sentinels())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
    pub min: f32,
    pub max: f32,
    pub valid: usize,
    pub no_data: usize,
    /// True when `min`/`max` are [`DEFAULT_RANGE`] because nothing was valid.
    pub defaulted: bool,
}

impl ElevationStats {
    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// Maps `value` to [0, 1]; no-data maps to 0 and a flat range to 0.5.
    pub fn normalize(&self, value: f32, filter: &NoDataFilter) -> f32 {
        if filter.is_no_data(value) {
            return 0.0;
        }
        let range = self.range();
        if range == 0.0 {
            return 0.5;
        }
        ((value - self.min) / range).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy)]
struct Partial {
    min: f32,
    max: f32,
    valid: usize,
    no_data: usize,
}

impl Partial {
    const EMPTY: Partial = Partial {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
        valid: 0,
        no_data: 0,
    };

    fn merge(self, other: Partial) -> Partial {
        Partial {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            valid: self.valid + other.valid,
            no_data: self.no_data + other.no_data,
        }
    }
}

fn scan_chunk(chunk: &[f32], filter: &NoDataFilter) -> Partial {
    let mut partial = Partial::EMPTY;
    for &v in chunk {
        if filter.is_no_data(v) {
            partial.no_data += 1;
            continue;
        }
        if v < partial.min {
            partial.min = v;
        }
        if v > partial.max {
            partial.max = v;
        }
        partial.valid += 1;
    }
    partial
}

/// Min/max over valid samples, scanned in parallel fixed-size chunks.
pub fn elevation_stats(samples: &[f32], filter: &NoDataFilter) -> ElevationStats {
    let total = samples
        .par_chunks(STATS_CHUNK)
        .map(|chunk| scan_chunk(chunk, filter))
        .reduce(|| Partial::EMPTY, Partial::merge);

    if total.no_data > 0 {
        log::warn!(
            "Excluded {} no-data samples of {} from elevation statistics",
            total.no_data,
            samples.len()
        );
    }
    if total.valid == 0 {
        log::warn!(
            "No valid elevation samples; assuming range {:?}",
            DEFAULT_RANGE
        );
        return ElevationStats {
            min: DEFAULT_RANGE.0,
            max: DEFAULT_RANGE.1,
            valid: 0,
            no_data: total.no_data,
            defaulted: true,
        };
    }
    ElevationStats {
        min: total.min,
        max: total.max,
        valid: total.valid,
        no_data: total.no_data,
        defaulted: false,
    }
}

/// Normalises every sample against `stats`, chunk by chunk.
pub fn normalize_elevations(
    samples: &[f32],
    stats: &ElevationStats,
    filter: &NoDataFilter,
) -> Vec<f32> {
    let mut out = vec![0.0f32; samples.len()];
    out.par_chunks_mut(STATS_CHUNK)
        .zip(samples.par_chunks(STATS_CHUNK))
        .for_each(|(dst, src)| {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = stats.normalize(s, filter);
            }
        });
    out
}
