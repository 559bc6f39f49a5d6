pub mod error;
pub mod geotiff;
pub mod grid;
pub mod guard;
pub mod normalize;
pub mod source;

pub use error::{GuardConfigError, IngestError, RasterError};
pub use grid::{ElevationGrid, GeoBounds, RgbBands};
pub use guard::{GuardConfig, IngestReport, IngestedRaster, RasterIngestGuard};
pub use source::{GridRaster, RasterSource, ResampleMethod};
