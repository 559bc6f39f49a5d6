use pcd_core::pointcloud::point::{Color, PointRecord};

use crate::parsers::las::header::LasHeader;
use crate::reader::cursor::BinaryCursor;

/// The buffer ended before `expected` records could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    pub expected: u64,
    pub decoded: u64,
    /// Byte offset of the first record that did not fit.
    pub record_offset: u64,
    pub buffer_len: usize,
}

/// Decodes fixed-length point records in file order.
///
/// Iteration ends after `point_count` records or at the first record that
/// runs past the end of the buffer; the latter is reported by
/// [`LasPointReader::short_read`] rather than as an error.
pub struct LasPointReader<'a> {
    cursor: BinaryCursor<'a>,
    header: &'a LasHeader,
    index: u64,
    short_read: Option<ShortRead>,
    colors_omitted: u64,
}

impl<'a> LasPointReader<'a> {
    pub fn new(buf: &'a [u8], header: &'a LasHeader) -> Self {
        Self {
            cursor: BinaryCursor::new(buf),
            header,
            index: 0,
            short_read: None,
            colors_omitted: 0,
        }
    }

    pub fn short_read(&self) -> Option<ShortRead> {
        self.short_read
    }

    /// Records whose colour bytes fell outside the buffer.
    pub fn colors_omitted(&self) -> u64 {
        self.colors_omitted
    }

    pub fn decoded(&self) -> u64 {
        self.index
    }

    fn stop(&mut self, record_offset: u64) {
        self.short_read = Some(ShortRead {
            expected: self.header.point_count,
            decoded: self.index,
            record_offset,
            buffer_len: self.cursor.len(),
        });
    }

    fn read_color(&mut self, start: usize) -> Option<Color> {
        let offset = self.header.point_format.color_offset()?;
        let at = start.checked_add(offset)?;
        match self.cursor.slice_at(at, 6) {
            Ok(_) => Some(Color {
                r: self.cursor.u16_at(at).ok()?,
                g: self.cursor.u16_at(at + 2).ok()?,
                b: self.cursor.u16_at(at + 4).ok()?,
            }),
            Err(_) => {
                self.colors_omitted += 1;
                None
            }
        }
    }
}

impl Iterator for LasPointReader<'_> {
    type Item = PointRecord;

    fn next(&mut self) -> Option<PointRecord> {
        if self.short_read.is_some() || self.index >= self.header.point_count {
            return None;
        }

        let record_length = self.header.point_record_length as u64;
        let start = self.header.offset_to_point_data as u64 + self.index * record_length;
        let end = start + record_length;
        let Some(start_at) = usize::try_from(start)
            .ok()
            .filter(|_| end <= self.cursor.len() as u64)
        else {
            self.stop(start);
            return None;
        };

        // the record is known to fit, and every record holds at least 12 bytes
        let x = self.cursor.i32_at(start_at).ok()?;
        let y = self.cursor.i32_at(start_at + 4).ok()?;
        let z = self.cursor.i32_at(start_at + 8).ok()?;
        let color = self.read_color(start_at);

        self.index += 1;
        Some(PointRecord { x, y, z, color })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.short_read.is_some() {
            return (0, Some(0));
        }
        // never more than the records left in the buffer, whatever the header claims
        let record_length = (self.header.point_record_length as u64).max(1);
        let next = self.header.offset_to_point_data as u64 + self.index * record_length;
        let fit = (self.cursor.len() as u64).saturating_sub(next) / record_length;
        let remaining = self.header.point_count.saturating_sub(self.index).min(fit);
        (0, usize::try_from(remaining).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::las::fixture::LasFixture;

    #[test]
    fn decodes_records_in_file_order() {
        let bytes = LasFixture::new(1, 2, 0, 20)
            .point_count(3)
            .point([1, 2, 3], None)
            .point([-4, -5, -6], None)
            .point([i32::MAX, i32::MIN, 0], None)
            .build();
        let header = LasHeader::parse(&bytes).unwrap();
        let mut reader = LasPointReader::new(&bytes, &header);
        let records: Vec<PointRecord> = reader.by_ref().collect();

        let xyz: Vec<(i32, i32, i32)> = records.iter().map(|r| (r.x, r.y, r.z)).collect();
        assert_eq!(
            xyz,
            vec![(1, 2, 3), (-4, -5, -6), (i32::MAX, i32::MIN, 0)]
        );
        assert!(records.iter().all(|r| r.color.is_none()));
        assert_eq!(reader.short_read(), None);
    }

    #[test]
    fn reads_color_at_format_offset() {
        for (format, record_length) in [
            (2u8, 26u16),
            (3, 34),
            (5, 63),
            (6, 34),
            (7, 36),
            (8, 38),
            (10, 67),
            (135, 26),
        ] {
            let bytes = LasFixture::new(1, 4, format, record_length)
                .point_count(1)
                .point([0, 0, 0], Some([0, 1234, 65535]))
                .build();
            let header = LasHeader::parse(&bytes).unwrap();
            let record = LasPointReader::new(&bytes, &header).next().unwrap();
            let color = record.color.unwrap();
            assert_eq!((color.r, color.g, color.b), (0, 1234, 65535), "format {format}");

            let unit = color.to_unit_rgb();
            assert_eq!(unit[1], (1234.0f64 / 65535.0) as f32);
            assert!(unit.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn stops_early_on_truncated_buffer() {
        let mut bytes = LasFixture::new(1, 2, 1, 28)
            .point_count(4)
            .point([1, 1, 1], None)
            .point([2, 2, 2], None)
            .point([3, 3, 3], None)
            .build();
        bytes.truncate(bytes.len() - 5);

        let header = LasHeader::parse(&bytes).unwrap();
        let mut reader = LasPointReader::new(&bytes, &header);
        let records: Vec<PointRecord> = reader.by_ref().collect();

        assert_eq!(records.len(), 2);
        let short = reader.short_read().unwrap();
        assert_eq!(short.expected, 4);
        assert_eq!(short.decoded, 2);
        assert_eq!(short.record_offset, 227 + 2 * 28);
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn color_past_buffer_end_is_omitted() {
        // format 6 keeps its colour at 28..34 while records are only 30 bytes
        let mut bytes = LasFixture::new(1, 4, 6, 30)
            .point_count(1)
            .point([9, 9, 9], None)
            .build();
        bytes.truncate(375 + 30);

        let header = LasHeader::parse(&bytes).unwrap();
        let mut reader = LasPointReader::new(&bytes, &header);
        let record = reader.next().unwrap();

        assert_eq!((record.x, record.y, record.z), (9, 9, 9));
        assert_eq!(record.color, None);
        assert_eq!(reader.colors_omitted(), 1);
        assert_eq!(reader.short_read(), None);
    }

    #[test]
    fn size_hint_is_bounded_by_buffer() {
        let bytes = LasFixture::new(1, 4, 0, 20)
            .point_count(3)
            .extended_count(0, 256)
            .point([1, 1, 1], None)
            .point([2, 2, 2], None)
            .build();
        let header = LasHeader::parse(&bytes).unwrap();
        assert_eq!(header.point_count, 1u64 << 40);

        let mut reader = LasPointReader::new(&bytes, &header);
        assert_eq!(reader.size_hint(), (0, Some(2)));
        reader.next();
        assert_eq!(reader.size_hint(), (0, Some(1)));
    }

    #[test]
    fn point_data_offset_past_end_reads_nothing() {
        let mut bytes = LasFixture::new(1, 2, 0, 20).point_count(2).build();
        bytes[96..100].copy_from_slice(&10_000u32.to_le_bytes());
        let header = LasHeader::parse(&bytes).unwrap();
        let mut reader = LasPointReader::new(&bytes, &header);

        assert_eq!(reader.next(), None);
        assert_eq!(reader.short_read().map(|s| s.decoded), Some(0));
    }
}
