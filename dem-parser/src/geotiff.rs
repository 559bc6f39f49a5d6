//! Elevation rasters stored as GeoTIFF.

use std::io::Cursor;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::error::RasterError;
use crate::grid::{GeoBounds, RgbBands};
use crate::source::{nearest_index, resample_bilinear, RasterSource, ResampleMethod};

/// Matches the decoder's own default buffer limit.
pub const DEFAULT_DECODING_LIMIT: usize = 256 * 1024 * 1024;

const GEOGRAPHIC_TYPE_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_KEY: u32 = 3072;
const USER_DEFINED: u32 = 32767;

fn to_f32(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I16(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U16(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I32(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U32(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U8(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I8(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::U64(data) => data.iter().map(|&v| v as f32).collect(),
        DecodingResult::I64(data) => data.iter().map(|&v| v as f32).collect(),
    }
}

/// EPSG code from a GeoKey directory, projected CRS first.
fn epsg_from_geokeys(directory: &[u32]) -> Option<u16> {
    let entries = directory.get(4..)?;
    let mut geographic = None;
    for key in entries.chunks_exact(4) {
        // inline values only; location 0 means the value is stored in the entry
        if key[1] != 0 || key[3] == USER_DEFINED {
            continue;
        }
        match key[0] {
            PROJECTED_CS_TYPE_KEY => return u16::try_from(key[3]).ok(),
            GEOGRAPHIC_TYPE_KEY => geographic = u16::try_from(key[3]).ok(),
            _ => {}
        }
    }
    geographic
}

fn bounds_from_tags(
    width: u32,
    height: u32,
    pixel_scale: Option<&[f64]>,
    tiepoint: Option<&[f64]>,
) -> Option<GeoBounds> {
    let (scale, tie) = (pixel_scale?, tiepoint?);
    if scale.len() < 2 || tie.len() < 6 {
        return None;
    }
    let min_x = tie[3] - tie[0] * scale[0];
    let max_y = tie[4] + tie[1] * scale[1];
    Some(GeoBounds::new(
        min_x,
        max_y - height as f64 * scale[1],
        min_x + width as f64 * scale[0],
        max_y,
    ))
}

/// A GeoTIFF held in memory; pixels are decoded on each read.
///
/// Reads at native resolution decode the whole image and are subject to the
/// decoding limit. Nearest-neighbour reads at a target size decode one
/// strip or tile at a time under the separate chunk limit and keep only the
/// sampled pixels, so a raster refused whole can still be sampled as long as
/// each of its strips fits.
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: usize,
    rgb: bool,
    bounds: GeoBounds,
    no_data: Option<f32>,
    epsg: Option<u16>,
    decoding_limit: usize,
    chunk_limit: usize,
}

impl GeoTiffRaster {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RasterError> {
        let mut decoder = Decoder::new(Cursor::new(data.as_slice()))?;
        let (width, height) = decoder.dimensions()?;

        let colortype = decoder.colortype()?;
        let channels = match colortype {
            ColorType::Gray(_) => 1,
            ColorType::GrayA(_) => 2,
            ColorType::RGB(_) => 3,
            ColorType::RGBA(_) => 4,
            other => {
                return Err(RasterError::Unsupported(format!(
                    "colour type {other:?}"
                )))
            }
        };
        if channels > 1 {
            let planar = decoder
                .find_tag(Tag::PlanarConfiguration)?
                .map(|v| v.into_u32())
                .transpose()?;
            if planar == Some(2) {
                return Err(RasterError::Unsupported(
                    "planar multi-band layout".to_string(),
                ));
            }
        }

        let pixel_scale = decoder
            .find_tag(Tag::ModelPixelScaleTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?;
        let tiepoint = decoder
            .find_tag(Tag::ModelTiepointTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?;
        let bounds =
            bounds_from_tags(width, height, pixel_scale.as_deref(), tiepoint.as_deref())
                .unwrap_or_else(|| {
                    log::warn!("GeoTIFF has no georeferencing tags; using pixel bounds");
                    GeoBounds::pixel_span(width, height)
                });

        let no_data = match decoder.find_tag(Tag::GdalNodata)? {
            Some(value) => {
                let text = value.into_string()?;
                let parsed = text.trim_matches(char::from(0)).trim().parse::<f32>();
                if parsed.is_err() {
                    log::warn!("Ignoring unparsable GDAL_NODATA value {:?}", text);
                }
                parsed.ok()
            }
            None => None,
        };

        let epsg = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
            Some(value) => epsg_from_geokeys(&value.into_u32_vec()?),
            None => {
                log::warn!("GeoTIFF has no GeoKey directory; CRS unknown");
                None
            }
        };

        log::debug!(
            "GeoTIFF {}x{} {:?}, bounds {:?}, no-data {:?}, EPSG {:?}",
            width,
            height,
            colortype,
            bounds,
            no_data,
            epsg
        );
        drop(decoder);

        Ok(Self {
            width,
            height,
            channels,
            rgb: matches!(colortype, ColorType::RGB(8) | ColorType::RGBA(8)),
            bounds,
            no_data,
            epsg,
            decoding_limit: DEFAULT_DECODING_LIMIT,
            chunk_limit: DEFAULT_DECODING_LIMIT,
            data,
        })
    }

    /// Caps the bytes a native-resolution read may allocate.
    pub fn with_decoding_limit(mut self, bytes: usize) -> Self {
        self.decoding_limit = bytes;
        self
    }

    /// Caps the bytes of a single strip or tile in a sampled read.
    pub fn with_chunk_limit(mut self, bytes: usize) -> Self {
        self.chunk_limit = bytes;
        self
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    fn decoder(&self, buffer_limit: usize) -> Result<Decoder<Cursor<&[u8]>>, RasterError> {
        let mut limits = Limits::default();
        limits.decoding_buffer_size = buffer_limit;
        Ok(Decoder::new(Cursor::new(self.data.as_slice()))?.with_limits(limits))
    }

    /// All channels, interleaved, at native resolution.
    fn read_native(&self) -> Result<Vec<f32>, RasterError> {
        let mut decoder = self.decoder(self.decoding_limit)?;
        Ok(to_f32(decoder.read_image()?))
    }

    /// All channels, interleaved, sampled at `(target_width, target_height)`.
    fn read_sampled(&self, target_width: u32, target_height: u32) -> Result<Vec<f32>, RasterError> {
        let mut decoder = self.decoder(self.chunk_limit)?;
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        if chunk_width == 0 || chunk_height == 0 {
            return Err(RasterError::Invalid("zero-sized strip or tile".to_string()));
        }
        let across = self.width.div_ceil(chunk_width);
        let down = self.height.div_ceil(chunk_height);
        let cols: Vec<u32> = (0..target_width)
            .map(|x| nearest_index(x, self.width, target_width))
            .collect();
        let rows: Vec<u32> = (0..target_height)
            .map(|y| nearest_index(y, self.height, target_height))
            .collect();

        let channels = self.channels;
        let mut out = vec![f32::NAN; target_width as usize * target_height as usize * channels];
        for chunk_row in 0..down {
            let row_start = chunk_row * chunk_height;
            let row_end = row_start + chunk_height;
            let wanted_rows: Vec<usize> = (0..rows.len())
                .filter(|&ty| (row_start..row_end).contains(&rows[ty]))
                .collect();
            if wanted_rows.is_empty() {
                continue;
            }
            for chunk_col in 0..across {
                let col_start = chunk_col * chunk_width;
                let col_end = col_start + chunk_width;
                let wanted_cols: Vec<usize> = (0..cols.len())
                    .filter(|&tx| (col_start..col_end).contains(&cols[tx]))
                    .collect();
                if wanted_cols.is_empty() {
                    continue;
                }

                let index = chunk_row * across + chunk_col;
                let (data_width, data_height) = decoder.chunk_data_dimensions(index);
                let chunk = to_f32(decoder.read_chunk(index)?);
                let row_len = data_height as usize * channels;
                let stride = if row_len > 0 && chunk.len() % row_len == 0 {
                    chunk.len() / row_len
                } else {
                    data_width as usize
                };

                for &ty in &wanted_rows {
                    let ry = (rows[ty] - row_start) as usize;
                    for &tx in &wanted_cols {
                        let rx = (cols[tx] - col_start) as usize;
                        let src = (ry * stride + rx) * channels;
                        let dst = (ty * target_width as usize + tx) * channels;
                        for c in 0..channels {
                            if let Some(&v) = chunk.get(src + c) {
                                out[dst + c] = v;
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    fn read_interleaved(
        &self,
        target: Option<(u32, u32)>,
        method: ResampleMethod,
    ) -> Result<(Vec<f32>, u32, u32), RasterError> {
        match (target, method) {
            (Some((w, h)), ResampleMethod::Nearest) => Ok((self.read_sampled(w, h)?, w, h)),
            _ => Ok((self.read_native()?, self.width, self.height)),
        }
    }
}

impl RasterSource for GeoTiffRaster {
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
        let (data, w, h) = self.read_interleaved(target, method)?;
        // the first band carries elevation
        let band: Vec<f32> = data.iter().step_by(self.channels).copied().collect();
        match target {
            Some((tw, th)) if (tw, th) != (w, h) => resample_bilinear(&band, w, h, tw, th)
                .ok_or_else(|| {
                    RasterError::Invalid(format!(
                        "decoded {} samples for a {}x{} image",
                        band.len(),
                        w,
                        h
                    ))
                }),
            _ => Ok(band),
        }
    }

    fn read_rgb(&self, target: Option<(u32, u32)>) -> Result<Option<RgbBands>, RasterError> {
        if !self.rgb {
            return Ok(None);
        }
        let (data, _, _) = self.read_interleaved(target, ResampleMethod::Nearest)?;
        let bytes: Vec<u8> = data.iter().map(|&v| v.clamp(0.0, 255.0) as u8).collect();
        Ok(Some(RgbBands::from_interleaved(&bytes, self.channels)))
    }

    fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    fn epsg(&self) -> Option<u16> {
        self.epsg
    }
}
