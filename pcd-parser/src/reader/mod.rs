pub mod cursor;
pub mod las;

pub use cursor::{BinaryCursor, OutOfBounds};
