use pcd_core::error::FailureKind;
use thiserror::Error;

/// Failures reported by a raster decoding collaborator.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("raster decoder ran out of resources: {0}")]
    ResourceExhausted(String),

    #[error("invalid raster: {0}")]
    Invalid(String),

    #[error("unsupported raster feature: {0}")]
    Unsupported(String),

    #[error("failed to read raster input: {0}")]
    Io(#[from] std::io::Error),
}

/// A guard setting that cannot produce a raster.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardConfigError {
    #[error("{field} must be at least 1 pixel")]
    ZeroDimension { field: String },
}

impl RasterError {
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, RasterError::ResourceExhausted(_))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            RasterError::ResourceExhausted(_) => FailureKind::TooLarge,
            RasterError::Invalid(_) => FailureKind::BadFile,
            RasterError::Unsupported(_) => FailureKind::Unsupported,
            RasterError::Io(_) => FailureKind::Io,
        }
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(e: tiff::TiffError) -> Self {
        match e {
            tiff::TiffError::LimitsExceeded => RasterError::ResourceExhausted(e.to_string()),
            tiff::TiffError::IoError(io) => RasterError::Io(io),
            tiff::TiffError::UnsupportedError(_) => RasterError::Unsupported(e.to_string()),
            other => RasterError::Invalid(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(
        "raster too large: {width}x{height} could not be decoded even at the emergency {emergency}px resolution ({source})"
    )]
    TooLarge {
        width: u32,
        height: u32,
        emergency: u32,
        #[source]
        source: RasterError,
    },

    #[error("invalid raster: {width}x{height} has no pixels")]
    Empty { width: u32, height: u32 },

    #[error(transparent)]
    Raster(#[from] RasterError),
}

impl IngestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::TooLarge { .. } => FailureKind::TooLarge,
            IngestError::Empty { .. } => FailureKind::BadFile,
            IngestError::Raster(e) => e.kind(),
        }
    }
}
