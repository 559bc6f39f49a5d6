use pcd_core::error::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid LAS file: signature {found:?} is not \"LASF\"")]
    InvalidSignature { found: [u8; 4] },

    #[error("invalid LAS file: header needs {required} bytes but the buffer holds {len}")]
    TruncatedHeader { required: usize, len: usize },

    #[error("unsupported LAS feature: version {major}.{minor} (only 1.0 to 1.4 are read)")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("unsupported LAS feature: point data format {0}")]
    UnsupportedPointFormat(u8),

    #[error(
        "invalid LAS file: point record length {length} is shorter than the {minimum} bytes format {format} requires"
    )]
    InvalidRecordLength {
        format: u8,
        length: u16,
        minimum: u16,
    },

    #[error("failed to read LAS input: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ParseError::InvalidSignature { .. }
            | ParseError::TruncatedHeader { .. }
            | ParseError::InvalidRecordLength { .. } => FailureKind::BadFile,
            ParseError::UnsupportedVersion { .. } | ParseError::UnsupportedPointFormat(_) => {
                FailureKind::Unsupported
            }
            ParseError::Io(_) => FailureKind::Io,
        }
    }
}
