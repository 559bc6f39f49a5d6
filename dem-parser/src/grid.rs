use serde::{Deserialize, Serialize};

/// Geographic extent of a raster, in the raster's own CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl GeoBounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounds spanning the pixel grid itself, used when a raster carries no geotags.
    pub fn pixel_span(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when either extent is zero, negative or not finite.
    pub fn is_degenerate(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }
}

/// Per-pixel colour bands, one byte per pixel and channel.
///
/// Bands may be shorter than the grid; consumers pad the shortfall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RgbBands {
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

impl RgbBands {
    /// Splits interleaved RGB(A) bytes into bands.
    pub fn from_interleaved(data: &[u8], channels: usize) -> Self {
        let mut bands = RgbBands::default();
        if channels < 3 {
            return bands;
        }
        let pixels = data.len() / channels;
        bands.red.reserve(pixels);
        bands.green.reserve(pixels);
        bands.blue.reserve(pixels);
        for px in data.chunks_exact(channels) {
            bands.red.push(px[0]);
            bands.green.push(px[1]);
            bands.blue.push(px[2]);
        }
        bands
    }

    /// Colour of pixel `i` scaled to [0, 1], if all three bands cover it.
    pub fn unit_rgb(&self, i: usize) -> Option<[f32; 3]> {
        Some([
            *self.red.get(i)? as f32 / 255.0,
            *self.green.get(i)? as f32 / 255.0,
            *self.blue.get(i)? as f32 / 255.0,
        ])
    }

    /// Pixels covered by all three bands.
    pub fn len(&self) -> usize {
        self.red.len().min(self.green.len()).min(self.blue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row-major elevation samples with their extent.
///
/// `samples.len() == width * height` always holds; [`ElevationGrid::new`]
/// repairs sources that disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: u32,
    height: u32,
    samples: Vec<f32>,
    bounds: GeoBounds,
    rgb: Option<RgbBands>,
}

impl ElevationGrid {
    pub fn new(width: u32, height: u32, mut samples: Vec<f32>, bounds: GeoBounds) -> Self {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            log::warn!(
                "Elevation grid {}x{} expected {} samples but got {}; {}",
                width,
                height,
                expected,
                samples.len(),
                if samples.len() > expected {
                    "truncating"
                } else {
                    "padding with no-data"
                }
            );
            samples.resize(expected, f32::NAN);
        }
        Self {
            width,
            height,
            samples,
            bounds,
            rgb: None,
        }
    }

    pub fn with_rgb(mut self, rgb: RgbBands) -> Self {
        self.rgb = Some(rgb);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample(&self, col: u32, row: u32) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.samples
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn rgb(&self) -> Option<&RgbBands> {
        self.rgb.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_sample_count() {
        let bounds = GeoBounds::new(0.0, 0.0, 1.0, 1.0);

        let long = ElevationGrid::new(2, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], bounds);
        assert_eq!(long.samples(), &[1.0, 2.0, 3.0, 4.0]);

        let short = ElevationGrid::new(2, 2, vec![1.0], bounds);
        assert_eq!(short.len(), 4);
        assert_eq!(short.sample(0, 0), Some(1.0));
        assert!(short.samples()[1..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sample_lookup_is_row_major() {
        let grid = ElevationGrid::new(
            3,
            2,
            vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0],
            GeoBounds::pixel_span(3, 2),
        );
        assert_eq!(grid.sample(2, 0), Some(2.0));
        assert_eq!(grid.sample(1, 1), Some(11.0));
        assert_eq!(grid.sample(3, 0), None);
    }

    #[test]
    fn degenerate_bounds() {
        assert!(!GeoBounds::new(0.0, 0.0, 2.0, 1.0).is_degenerate());
        assert!(GeoBounds::new(5.0, 0.0, 5.0, 1.0).is_degenerate());
        assert!(GeoBounds::new(0.0, 0.0, f64::NAN, 1.0).is_degenerate());
    }

    #[test]
    fn rgb_bands_split_interleaved() {
        let bands = RgbBands::from_interleaved(&[255, 0, 51, 9, 1, 2, 3, 9], 4);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands.unit_rgb(0), Some([1.0, 0.0, 0.2]));
        assert_eq!(bands.unit_rgb(2), None);
    }
}
