//! Distance-keyed level of detail for point clouds.
//!
//! A ladder of tiers maps viewer distance to a point budget. Every update tick
//! the caller passes the previous [`LodState`] together with the current
//! [`CameraPose`]; the manager returns the next state. Resampling happens only
//! when the distance crosses into a different tier, and always starts from the
//! full-resolution cloud.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pointcloud::decimation::decimator::{
    DisplayedPointCloud, PointCloudDecimator, StrideDecimator,
};
use crate::pointcloud::point::NormalizedPointCloud;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodTier {
    /// Upper distance bound of the tier. `null` in config files means +inf.
    #[serde(with = "distance_bound")]
    pub max_distance: f64,
    pub point_budget: u64,
    pub stride_hint: u32,
}

impl LodTier {
    pub const fn new(max_distance: f64, point_budget: u64, stride_hint: u32) -> Self {
        Self {
            max_distance,
            point_budget,
            stride_hint,
        }
    }
}

mod distance_bound {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LodError {
    #[error("LOD ladder must contain at least one tier")]
    Empty,
    #[error("LOD tier {index} max distance {distance} is not above the previous tier")]
    NotAscending { index: usize, distance: f64 },
    #[error("LOD tier {index} max distance is NaN")]
    NanDistance { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub tiers: Vec<LodTier>,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                LodTier::new(50.0, 1_000_000, 1),
                LodTier::new(100.0, 500_000, 2),
                LodTier::new(200.0, 250_000, 4),
                LodTier::new(500.0, 100_000, 10),
                LodTier::new(1000.0, 50_000, 20),
                LodTier::new(f64::INFINITY, 25_000, 40),
            ],
        }
    }
}

impl LodConfig {
    pub fn into_ladder(self) -> Result<LodLadder, LodError> {
        LodLadder::new(self.tiers)
    }
}

/// Validated tier list, ascending by `max_distance`. The last tier catches
/// every distance beyond the others.
#[derive(Debug, Clone, PartialEq)]
pub struct LodLadder {
    tiers: Vec<LodTier>,
}

impl LodLadder {
    pub fn new(tiers: Vec<LodTier>) -> Result<Self, LodError> {
        if tiers.is_empty() {
            return Err(LodError::Empty);
        }
        for (index, tier) in tiers.iter().enumerate() {
            if tier.max_distance.is_nan() {
                return Err(LodError::NanDistance { index });
            }
            if index > 0 && tier.max_distance <= tiers[index - 1].max_distance {
                return Err(LodError::NotAscending {
                    index,
                    distance: tier.max_distance,
                });
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[LodTier] {
        &self.tiers
    }

    /// Index of the first tier whose `max_distance >= distance`.
    pub fn select(&self, distance: f64) -> usize {
        self.tiers
            .iter()
            .position(|tier| tier.max_distance >= distance)
            .unwrap_or(self.tiers.len() - 1)
    }
}

impl Default for LodLadder {
    fn default() -> Self {
        Self {
            tiers: LodConfig::default().tiers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: [f64; 3],
    pub target: [f64; 3],
}

impl CameraPose {
    pub fn distance(&self) -> f64 {
        let dx = self.position[0] - self.target[0];
        let dy = self.position[1] - self.target[1];
        let dz = self.position[2] - self.target[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// What is currently on screen. Cloning is cheap; the displayed buffer is
/// shared, never copied.
#[derive(Debug, Clone, Default)]
pub struct LodState {
    active_tier: Option<usize>,
    displayed: Option<Arc<DisplayedPointCloud>>,
}

impl LodState {
    pub fn active_tier(&self) -> Option<usize> {
        self.active_tier
    }

    pub fn displayed(&self) -> Option<&Arc<DisplayedPointCloud>> {
        self.displayed.as_ref()
    }
}

pub struct LodManager {
    ladder: LodLadder,
    canonical: Arc<NormalizedPointCloud>,
}

impl LodManager {
    pub fn new(ladder: LodLadder, canonical: Arc<NormalizedPointCloud>) -> Self {
        Self { ladder, canonical }
    }

    pub fn ladder(&self) -> &LodLadder {
        &self.ladder
    }

    pub fn canonical(&self) -> &Arc<NormalizedPointCloud> {
        &self.canonical
    }

    /// Advance one tick. Returns `state` untouched when the distance stays in
    /// the active tier, otherwise a state holding a freshly sampled buffer.
    pub fn update(&self, state: LodState, camera: &CameraPose) -> LodState {
        let distance = camera.distance();
        let tier_index = self.ladder.select(distance);
        if state.active_tier == Some(tier_index) {
            return state;
        }

        let tier = &self.ladder.tiers[tier_index];
        let start = std::time::Instant::now();
        let displayed = StrideDecimator {
            point_budget: tier.point_budget,
        }
        .decimate(&self.canonical);

        log::debug!(
            "LOD tier {:?} -> {} at distance {:.2}: {} of {} points (stride {}) in {:?}",
            state.active_tier,
            tier_index,
            distance,
            displayed.len(),
            displayed.source_count,
            displayed.stride,
            start.elapsed()
        );

        LodState {
            active_tier: Some(tier_index),
            displayed: Some(Arc::new(displayed)),
        }
    }
}
