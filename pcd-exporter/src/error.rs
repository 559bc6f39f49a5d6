use pcd_core::error::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid render buffers: {attribute} holds {len} floats, not whole vec3s")]
    NotVec3 { attribute: &'static str, len: usize },

    #[error("invalid render buffers: {colors} colours for {positions} positions")]
    LengthMismatch { positions: usize, colors: usize },

    #[error("invalid render buffers: index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },

    #[error("export too large: {0} bytes exceed the 4 GiB binary glTF limit")]
    TooLarge(usize),

    #[error("failed to serialize glTF JSON")]
    Json(#[from] serde_json::Error),

    #[error("failed to write export")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExportError::NotVec3 { .. }
            | ExportError::LengthMismatch { .. }
            | ExportError::IndexOutOfRange { .. }
            | ExportError::Json(_) => FailureKind::BadFile,
            ExportError::TooLarge(_) => FailureKind::TooLarge,
            ExportError::Io(_) => FailureKind::Io,
        }
    }
}
