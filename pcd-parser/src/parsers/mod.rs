use crate::error::ParseError;

pub mod las;

pub use las::ParsedPointCloud;

pub trait Parser {
    fn parse(&self) -> Result<ParsedPointCloud, ParseError>;
}
