use std::path::Path;

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Las,
    GeoTiff,
}

impl InputKind {
    /// Resolves the kind from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| InputError::MissingExtension {
                path: path.to_path_buf(),
            })?;

        match extension.to_ascii_lowercase().as_str() {
            "las" => Ok(InputKind::Las),
            "tif" | "tiff" => Ok(InputKind::GeoTiff),
            _ => Err(InputError::UnknownExtension {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            }),
        }
    }
}
