use pcd_core::pointcloud::point::{BoundingVolume, Metadata};

use crate::error::ParseError;
use crate::parsers::las::format::PointFormat;
use crate::reader::cursor::{BinaryCursor, OutOfBounds};

const SIGNATURE: &[u8; 4] = b"LASF";

const VERSION_MAJOR: usize = 24;
const VERSION_MINOR: usize = 25;
const OFFSET_TO_POINT_DATA: usize = 96;
const POINT_FORMAT: usize = 104;
const POINT_RECORD_LENGTH: usize = 105;
const LEGACY_POINT_COUNT: usize = 107;
const SCALE_AND_OFFSET: usize = 131;
const BOUNDS: usize = 179;
const EXTENDED_COUNT_LOW: usize = 247;
const EXTENDED_COUNT_HIGH: usize = 251;

/// Public header block size per minor version.
fn header_size(minor: u8) -> usize {
    match minor {
        0..=2 => 227,
        3 => 235,
        _ => 375,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LasHeader {
    pub version: (u8, u8),
    pub point_format: PointFormat,
    pub point_record_length: u16,
    pub legacy_point_count: u32,
    /// The 64-bit extended count when present and non-zero, else the legacy count.
    pub point_count: u64,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub min_bounds: [f64; 3],
    pub max_bounds: [f64; 3],
    pub offset_to_point_data: u32,
}

impl LasHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let cursor = BinaryCursor::new(buf);
        let truncated = |e: OutOfBounds| ParseError::TruncatedHeader {
            required: e.offset + e.len,
            len: e.available,
        };

        let signature = cursor.slice_at(0, 4).map_err(truncated)?;
        if signature != SIGNATURE {
            let mut found = [0u8; 4];
            found.copy_from_slice(signature);
            return Err(ParseError::InvalidSignature { found });
        }

        let major = cursor.u8_at(VERSION_MAJOR).map_err(truncated)?;
        let minor = cursor.u8_at(VERSION_MINOR).map_err(truncated)?;
        if major != 1 || minor > 4 {
            return Err(ParseError::UnsupportedVersion { major, minor });
        }

        let required = header_size(minor);
        if buf.len() < required {
            return Err(ParseError::TruncatedHeader {
                required,
                len: buf.len(),
            });
        }

        let offset_to_point_data = cursor.u32_at(OFFSET_TO_POINT_DATA).map_err(truncated)?;

        let format_code = cursor.u8_at(POINT_FORMAT).map_err(truncated)?;
        let point_format = PointFormat::from_code(format_code)
            .ok_or(ParseError::UnsupportedPointFormat(format_code))?;

        let point_record_length = cursor.u16_at(POINT_RECORD_LENGTH).map_err(truncated)?;
        if point_record_length < point_format.min_record_length() {
            return Err(ParseError::InvalidRecordLength {
                format: format_code,
                length: point_record_length,
                minimum: point_format.min_record_length(),
            });
        }

        let legacy_point_count = cursor.u32_at(LEGACY_POINT_COUNT).map_err(truncated)?;

        let mut seq = cursor.clone();
        seq.seek(SCALE_AND_OFFSET);
        let mut scale = [0.0; 3];
        let mut offset = [0.0; 3];
        for value in scale.iter_mut().chain(offset.iter_mut()) {
            *value = seq.read_f64().map_err(truncated)?;
        }

        // stored as max x, min x, max y, min y, max z, min z
        seq.seek(BOUNDS);
        let mut min_bounds = [0.0; 3];
        let mut max_bounds = [0.0; 3];
        for axis in 0..3 {
            max_bounds[axis] = seq.read_f64().map_err(truncated)?;
            min_bounds[axis] = seq.read_f64().map_err(truncated)?;
        }

        let mut point_count = legacy_point_count as u64;
        if minor >= 4 {
            let low = cursor.u32_at(EXTENDED_COUNT_LOW).map_err(truncated)? as u64;
            let high = cursor.u32_at(EXTENDED_COUNT_HIGH).map_err(truncated)? as u64;
            let extended = low + (high << 32);
            if extended > 0 {
                point_count = extended;
            }
        }

        log::debug!(
            "LAS {}.{} header: format {}, record length {}, {} points at offset {}",
            major,
            minor,
            format_code,
            point_record_length,
            point_count,
            offset_to_point_data
        );

        Ok(LasHeader {
            version: (major, minor),
            point_format,
            point_record_length,
            legacy_point_count,
            point_count,
            scale,
            offset,
            min_bounds,
            max_bounds,
            offset_to_point_data,
        })
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            point_count: self.point_count,
            bounding_volume: BoundingVolume {
                min: self.min_bounds,
                max: self.max_bounds,
            },
            scale: self.scale,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::las::fixture::LasFixture;
    use pcd_core::error::FailureKind;

    #[test]
    fn parses_reference_header() {
        let bytes = LasFixture::new(1, 2, 3, 34)
            .point_count(100)
            .scale([0.01; 3])
            .bounds([0.0, 0.0, 0.0], [100.0, 100.0, 10.0])
            .build();

        let header = LasHeader::parse(&bytes).unwrap();
        assert_eq!(header.version, (1, 2));
        assert_eq!(header.point_format, PointFormat::F3);
        assert_eq!(header.point_record_length, 34);
        assert_eq!(header.point_count, 100);
        assert_eq!(header.scale, [0.01; 3]);
        assert_eq!(header.offset, [0.0; 3]);
        assert_eq!(header.min_bounds, [0.0, 0.0, 0.0]);
        assert_eq!(header.max_bounds, [100.0, 100.0, 10.0]);
        assert_eq!(header.offset_to_point_data, 227);
    }

    #[test]
    fn extended_count_supersedes_legacy_on_1_4() {
        let bytes = LasFixture::new(1, 4, 6, 30)
            .point_count(7)
            .extended_count(5, 2)
            .build();
        let header = LasHeader::parse(&bytes).unwrap();
        assert_eq!(header.legacy_point_count, 7);
        assert_eq!(header.point_count, 5 + 2 * (1u64 << 32));
    }

    #[test]
    fn zero_extended_count_keeps_legacy() {
        let bytes = LasFixture::new(1, 4, 0, 20).point_count(42).build();
        assert_eq!(LasHeader::parse(&bytes).unwrap().point_count, 42);
    }

    #[test]
    fn extended_words_ignored_before_1_4() {
        let mut bytes = LasFixture::new(1, 3, 1, 28)
            .point_count(9)
            .point([0, 0, 0], None)
            .build();
        bytes[247] = 0xff;
        assert_eq!(LasHeader::parse(&bytes).unwrap().point_count, 9);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = LasFixture::new(1, 2, 0, 20).build();
        bytes[0..4].copy_from_slice(b"LASZ");
        let err = LasHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSignature { found } if &found == b"LASZ"));
        assert_eq!(err.kind(), FailureKind::BadFile);
    }

    #[test]
    fn rejects_unknown_versions() {
        for (major, minor) in [(2, 0), (1, 5), (0, 9)] {
            let bytes = LasFixture::new(major, minor, 0, 20).build();
            let err = LasHeader::parse(&bytes).unwrap_err();
            assert!(matches!(
                err,
                ParseError::UnsupportedVersion { major: a, minor: b } if a == major && b == minor
            ));
            assert_eq!(err.kind(), FailureKind::Unsupported);
        }
    }

    #[test]
    fn rejects_unknown_point_format() {
        let bytes = LasFixture::new(1, 2, 11, 40).build();
        let err = LasHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedPointFormat(11)));
        assert!(err.to_string().starts_with("unsupported LAS feature"));
    }

    #[test]
    fn rejects_short_record_length() {
        let bytes = LasFixture::new(1, 2, 3, 20).build();
        assert!(matches!(
            LasHeader::parse(&bytes),
            Err(ParseError::InvalidRecordLength {
                format: 3,
                length: 20,
                minimum: 34
            })
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let bytes = LasFixture::new(1, 4, 0, 20).build();
        let err = LasHeader::parse(&bytes[..300]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::TruncatedHeader {
                required: 375,
                len: 300
            }
        ));
        assert!(matches!(
            LasHeader::parse(b"LA"),
            Err(ParseError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn metadata_carries_quantization() {
        let bytes = LasFixture::new(1, 2, 2, 26)
            .point_count(3)
            .scale([0.5, 0.25, 0.125])
            .offset([10.0, 20.0, 30.0])
            .bounds([1.0, 2.0, 3.0], [4.0, 5.0, 6.0])
            .build();
        let metadata = LasHeader::parse(&bytes).unwrap().metadata();
        assert_eq!(metadata.point_count, 3);
        assert_eq!(metadata.scale, [0.5, 0.25, 0.125]);
        assert_eq!(metadata.offset, [10.0, 20.0, 30.0]);
        assert_eq!(metadata.bounding_volume.center(), [2.5, 3.5, 4.5]);
    }
}
