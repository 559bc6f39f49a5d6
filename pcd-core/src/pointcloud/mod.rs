pub mod decimation;
pub mod lod;
pub mod normalize;
pub mod point;
