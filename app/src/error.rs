use std::path::PathBuf;

use dem_mesh::MeshError;
use dem_parser::{GuardConfigError, IngestError, RasterError};
use pcd_core::error::FailureKind;
use pcd_core::pointcloud::lod::LodError;
use pcd_exporter::ExportError;
use pcd_parser::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown log level {0:?} (expected off, error, warn, info, debug or trace)")]
    LogLevel(String),

    #[error("invalid LOD tiers: {0}")]
    Lod(#[from] LodError),

    #[error("invalid raster guard setting: {0}")]
    Guard(#[from] GuardConfigError),

    #[error("invalid height scale {0}")]
    HeightScale(f32),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unsupported input {path}: no file extension")]
    MissingExtension { path: PathBuf },

    #[error("unsupported input {path}: .{extension} is neither LAS nor GeoTIFF")]
    UnknownExtension { path: PathBuf, extension: String },
}

/// Failure while processing a single input.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("{path} holds no points")]
    EmptyCloud { path: PathBuf },

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Input(_) => FailureKind::Unsupported,
            PipelineError::Parse(e) => e.kind(),
            PipelineError::Raster(e) => e.kind(),
            PipelineError::Ingest(e) => e.kind(),
            PipelineError::Mesh(e) => e.kind(),
            PipelineError::Export(e) => e.kind(),
            PipelineError::EmptyCloud { .. } => FailureKind::BadFile,
            PipelineError::OutputDir { .. } => FailureKind::Io,
        }
    }
}
