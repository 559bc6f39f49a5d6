pub mod builder;
pub mod color;
pub mod error;
pub mod manager;
pub mod settings;

pub use builder::{TerrainMesh, TerrainMeshBuilder};
pub use error::MeshError;
pub use manager::TerrainManager;
pub use settings::{HeightMode, TerrainSettings};
