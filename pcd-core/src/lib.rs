pub mod cache;
pub mod crs;
pub mod error;
pub mod pointcloud;
