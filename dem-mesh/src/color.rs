//! Elevation colour ramp.

/// Padding colour for pixels the RGB bands do not cover.
pub const NEUTRAL_GRAY: [f32; 3] = [0.5, 0.5, 0.5];

/// Stops at 0, 1/3, 2/3 and 1: water, lowland, hillside, snow.
pub const TERRAIN_RAMP: [[f32; 3]; 4] = [
    [0.12, 0.36, 0.78],
    [0.24, 0.62, 0.26],
    [0.58, 0.45, 0.28],
    [1.0, 1.0, 1.0],
];

/// Colour at `t` in [0, 1], linearly blended between neighbouring stops.
pub fn ramp(t: f32) -> [f32; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = (TERRAIN_RAMP.len() - 1) as f32;
    let pos = t * segments;
    let lower = (pos.floor() as usize).min(TERRAIN_RAMP.len() - 2);
    let frac = pos - lower as f32;
    let (a, b) = (TERRAIN_RAMP[lower], TERRAIN_RAMP[lower + 1]);
    let keep = 1.0 - frac;
    [
        a[0] * keep + b[0] * frac,
        a[1] * keep + b[1] * frac,
        a[2] * keep + b[2] * frac,
    ]
}
