use std::path::PathBuf;

use pcd_core::pointcloud::{normalize::CoordinateNormalizer, point::NormalizedPointCloud};

use crate::error::ParseError;
use crate::reader::las::{LasPointReader, ShortRead};

use super::Parser;

#[cfg(test)]
pub(crate) mod fixture;
pub mod format;
pub mod header;

pub use format::PointFormat;
pub use header::LasHeader;

#[derive(Debug, Clone)]
pub struct ParsedPointCloud {
    pub header: LasHeader,
    pub cloud: NormalizedPointCloud,
    /// Set when the buffer ended before the declared point count.
    pub short_read: Option<ShortRead>,
}

/// Parses a LAS file already loaded into memory.
pub struct LasParser<'a> {
    pub buffer: &'a [u8],
}

impl Parser for LasParser<'_> {
    fn parse(&self) -> Result<ParsedPointCloud, ParseError> {
        let start = std::time::Instant::now();
        let header = LasHeader::parse(self.buffer)?;
        log::debug!("Read LAS header time: {:?}", start.elapsed());

        let start = std::time::Instant::now();
        let normalizer = CoordinateNormalizer::new(header.metadata());
        let mut reader = LasPointReader::new(self.buffer, &header);
        let cloud = normalizer.normalize_all(reader.by_ref());
        log::debug!("Build point cloud time: {:?}", start.elapsed());

        let short_read = reader.short_read();
        if let Some(short) = short_read {
            log::warn!(
                "LAS buffer ended early: decoded {} of {} points (record at byte {} exceeds {} bytes)",
                short.decoded,
                short.expected,
                short.record_offset,
                short.buffer_len
            );
        }
        if reader.colors_omitted() > 0 {
            log::warn!(
                "{} points had colour bytes past the end of the buffer and use the height ramp",
                reader.colors_omitted()
            );
        }

        Ok(ParsedPointCloud {
            header,
            cloud,
            short_read,
        })
    }
}

/// Reads the whole file into memory, then parses it with [`LasParser`].
pub struct LasFileParser {
    pub filename: PathBuf,
}

impl Parser for LasFileParser {
    fn parse(&self) -> Result<ParsedPointCloud, ParseError> {
        let start = std::time::Instant::now();
        let buffer = std::fs::read(&self.filename)?;
        log::debug!(
            "Read {} ({} bytes) time: {:?}",
            self.filename.display(),
            buffer.len(),
            start.elapsed()
        );
        LasParser { buffer: &buffer }.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture::LasFixture;

    fn reference_file() -> LasFixture {
        LasFixture::new(1, 2, 3, 34)
            .point_count(100)
            .scale([0.01; 3])
            .bounds([0.0; 3], [1.0, 1.0, 0.1])
    }

    #[test]
    fn raw_origin_without_color_is_recentred() {
        // format 1 has no colour fields; format 3 always decodes its colour bytes
        let bytes = LasFixture::new(1, 2, 1, 28)
            .point_count(1)
            .scale([0.01; 3])
            .bounds([0.0; 3], [1.0, 1.0, 0.1])
            .point([0, 0, 0], None)
            .build();
        let parsed = LasParser { buffer: &bytes }.parse().unwrap();

        assert_eq!(parsed.cloud.center(), [0.5, 0.5, 0.05]);
        assert_eq!(parsed.cloud.buffer().position(0), Some([-0.5, -0.5, -0.05]));
        // z sits on the bottom of the box, so t = 0
        assert_eq!(parsed.cloud.buffer().color(0), Some([0.0, 1.0, 0.5]));
        assert_eq!(parsed.short_read, None);
    }

    #[test]
    fn zeroed_color_bytes_decode_as_black() {
        let bytes = reference_file().point_count(1).point([0, 0, 0], None).build();
        let parsed = LasParser { buffer: &bytes }.parse().unwrap();
        assert_eq!(parsed.cloud.buffer().color(0), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn declared_count_beyond_buffer_returns_partial_cloud() {
        let bytes = reference_file()
            .point([100, 100, 10], Some([65535, 0, 0]))
            .point([0, 0, 0], None)
            .build();
        let parsed = LasParser { buffer: &bytes }.parse().unwrap();

        assert_eq!(parsed.header.point_count, 100);
        assert_eq!(parsed.cloud.len(), 2);
        assert_eq!(parsed.cloud.buffer().color(0), Some([1.0, 0.0, 0.0]));
        assert_eq!(parsed.short_read.map(|s| s.decoded), Some(2));
    }

    #[test]
    fn fatal_header_errors_yield_no_cloud() {
        let mut bytes = reference_file().point([0, 0, 0], None).build();
        bytes[104] = 42;
        assert!(matches!(
            LasParser { buffer: &bytes }.parse(),
            Err(ParseError::UnsupportedPointFormat(42))
        ));
    }

    #[test]
    fn file_parser_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.las");
        let bytes = reference_file().point_count(1).point([50, 50, 5], None).build();
        std::fs::write(&path, bytes).unwrap();

        let parsed = LasFileParser { filename: path }.parse().unwrap();
        assert_eq!(parsed.cloud.len(), 1);
        assert_eq!(parsed.cloud.buffer().position(0), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LasFileParser {
            filename: PathBuf::from("/definitely/not/here.las"),
        }
        .parse()
        .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
