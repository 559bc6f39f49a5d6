use serde::{Deserialize, Serialize};

use crate::error::RasterError;
use crate::grid::{GeoBounds, RgbBands};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Every output sample is a copy of one source sample.
    #[default]
    Nearest,
    Bilinear,
}

/// A raster decoding collaborator.
///
/// `target` is the `(width, height)` to resample to; `None` reads at native
/// resolution.
pub trait RasterSource {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn bounds(&self) -> GeoBounds;

    fn read_samples(
        &self,
        target: Option<(u32, u32)>,
        method: ResampleMethod,
    ) -> Result<Vec<f32>, RasterError>;

    /// Colour bands at the same resolution as `read_samples`, when the raster has them.
    fn read_rgb(&self, _target: Option<(u32, u32)>) -> Result<Option<RgbBands>, RasterError> {
        Ok(None)
    }

    /// Value the raster itself declares as "no data".
    fn no_data(&self) -> Option<f32> {
        None
    }

    fn epsg(&self) -> Option<u16> {
        None
    }

    fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Source index sampled for output index `i` when `src` cells map onto `dst`.
pub fn nearest_index(i: u32, src: u32, dst: u32) -> u32 {
    if dst == 0 || src == 0 {
        return 0;
    }
    let mapped = ((i as u64 * 2 + 1) * src as u64) / (dst as u64 * 2);
    mapped.min(src as u64 - 1) as u32
}

fn covers(len: usize, width: u32, height: u32) -> bool {
    width > 0 && height > 0 && len >= width as usize * height as usize
}

/// Resamples a row-major grid by copying the nearest source cell.
///
/// Returns `None` when `src` holds fewer than `src_width * src_height` cells.
pub fn resample_nearest<T: Copy>(
    src: &[T],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Option<Vec<T>> {
    if !covers(src.len(), src_width, src_height) {
        return None;
    }
    if src_width == dst_width && src_height == dst_height {
        return Some(src[..src_width as usize * src_height as usize].to_vec());
    }
    let cols: Vec<usize> = (0..dst_width)
        .map(|x| nearest_index(x, src_width, dst_width) as usize)
        .collect();
    let mut out = Vec::with_capacity(dst_width as usize * dst_height as usize);
    for y in 0..dst_height {
        let row = nearest_index(y, src_height, dst_height) as usize * src_width as usize;
        out.extend(cols.iter().map(|&x| src[row + x]));
    }
    Some(out)
}

/// Same contract as [`resample_nearest`].
pub fn resample_bilinear(
    src: &[f32],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Option<Vec<f32>> {
    if !covers(src.len(), src_width, src_height) {
        return None;
    }
    if src_width == dst_width && src_height == dst_height {
        return Some(src[..src_width as usize * src_height as usize].to_vec());
    }
    let at = |x: usize, y: usize| src[y * src_width as usize + x];
    let coord = |i: u32, s: u32, d: u32| -> (usize, usize, f32) {
        let pos = ((i as f32 + 0.5) * s as f32 / d as f32 - 0.5).clamp(0.0, (s - 1) as f32);
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(s as usize - 1);
        (lo, hi, pos - lo as f32)
    };
    let mut out = Vec::with_capacity(dst_width as usize * dst_height as usize);
    for y in 0..dst_height {
        let (y0, y1, ty) = coord(y, src_height, dst_height);
        for x in 0..dst_width {
            let (x0, x1, tx) = coord(x, src_width, dst_width);
            let top = at(x0, y0) * (1.0 - tx) + at(x1, y0) * tx;
            let bottom = at(x0, y1) * (1.0 - tx) + at(x1, y1) * tx;
            out.push(top * (1.0 - ty) + bottom * ty);
        }
    }
    Some(out)
}

/// An elevation raster already held in memory.
#[derive(Debug, Clone)]
pub struct GridRaster {
    width: u32,
    height: u32,
    samples: Vec<f32>,
    bounds: GeoBounds,
    rgb: Option<RgbBands>,
    no_data: Option<f32>,
}

impl GridRaster {
    pub fn new(width: u32, height: u32, samples: Vec<f32>, bounds: GeoBounds) -> Self {
        Self {
            width,
            height,
            samples,
            bounds,
            rgb: None,
            no_data: None,
        }
    }

    pub fn with_rgb(mut self, rgb: RgbBands) -> Self {
        self.rgb = Some(rgb);
        self
    }

    pub fn with_no_data(mut self, value: f32) -> Self {
        self.no_data = Some(value);
        self
    }

    fn target(&self, target: Option<(u32, u32)>) -> (u32, u32) {
        target.unwrap_or((self.width, self.height))
    }

    fn too_short(&self) -> RasterError {
        RasterError::Invalid(format!(
            "{}x{} grid holds only {} samples",
            self.width,
            self.height,
            self.samples.len()
        ))
    }
}

impl RasterSource for GridRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    fn read_samples(
        &self,
        target: Option<(u32, u32)>,
        method: ResampleMethod,
    ) -> Result<Vec<f32>, RasterError> {
        let (w, h) = self.target(target);
        if target.is_none() {
            // native reads hand the samples over as stored
            return Ok(self.samples.clone());
        }
        let resampled = match method {
            ResampleMethod::Nearest => {
                resample_nearest(&self.samples, self.width, self.height, w, h)
            }
            ResampleMethod::Bilinear => {
                resample_bilinear(&self.samples, self.width, self.height, w, h)
            }
        };
        resampled.ok_or_else(|| self.too_short())
    }

    fn read_rgb(&self, target: Option<(u32, u32)>) -> Result<Option<RgbBands>, RasterError> {
        let Some(rgb) = &self.rgb else {
            return Ok(None);
        };
        let Some((w, h)) = target else {
            return Ok(Some(rgb.clone()));
        };
        let band = |data: &[u8]| resample_nearest(data, self.width, self.height, w, h);
        let (red, green, blue) = (
            band(rgb.red.as_slice()),
            band(rgb.green.as_slice()),
            band(rgb.blue.as_slice()),
        );
        match (red, green, blue) {
            (Some(red), Some(green), Some(blue)) => Ok(Some(RgbBands { red, green, blue })),
            // short bands cannot be resampled; hand them over for padding
            _ => Ok(Some(rgb.clone())),
        }
    }

    fn no_data(&self) -> Option<f32> {
        self.no_data
    }
}
