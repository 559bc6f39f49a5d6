use pcd_core::error::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("invalid elevation grid: {width}x{height} is too small to triangulate")]
    TooSmall { width: u32, height: u32 },

    #[error("elevation grid too large: {vertices} vertices exceed 32-bit indices")]
    TooManyVertices { vertices: u64 },

    #[error("invalid terrain settings: height scale {0} is not finite")]
    InvalidHeightScale(f32),
}

impl MeshError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MeshError::TooSmall { .. } => FailureKind::BadFile,
            MeshError::TooManyVertices { .. } => FailureKind::TooLarge,
            MeshError::InvalidHeightScale(_) => FailureKind::Unsupported,
        }
    }
}
