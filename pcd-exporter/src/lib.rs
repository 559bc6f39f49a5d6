pub mod buffers;
pub mod error;
pub mod glb;
pub mod gltf;

pub use buffers::{BoundingInfo, RenderBuffers};
pub use error::ExportError;
pub use gltf::{generate_glb, write_glb, write_glb_file};
