//! In-memory LAS files for tests.

use byteorder::{ByteOrder as _, LittleEndian};

use crate::parsers::las::format::PointFormat;

pub struct LasFixture {
    major: u8,
    minor: u8,
    format: u8,
    record_length: u16,
    point_count: u32,
    extended: (u32, u32),
    scale: [f64; 3],
    offset: [f64; 3],
    min: [f64; 3],
    max: [f64; 3],
    records: Vec<Vec<u8>>,
}

impl LasFixture {
    pub fn new(major: u8, minor: u8, format: u8, record_length: u16) -> Self {
        Self {
            major,
            minor,
            format,
            record_length,
            point_count: 0,
            extended: (0, 0),
            scale: [1.0; 3],
            offset: [0.0; 3],
            min: [0.0; 3],
            max: [0.0; 3],
            records: Vec::new(),
        }
    }

    pub fn point_count(mut self, count: u32) -> Self {
        self.point_count = count;
        self
    }

    pub fn extended_count(mut self, low: u32, high: u32) -> Self {
        self.extended = (low, high);
        self
    }

    pub fn scale(mut self, scale: [f64; 3]) -> Self {
        self.scale = scale;
        self
    }

    pub fn offset(mut self, offset: [f64; 3]) -> Self {
        self.offset = offset;
        self
    }

    pub fn bounds(mut self, min: [f64; 3], max: [f64; 3]) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Appends one record; the declared point count is left to the caller.
    pub fn point(mut self, xyz: [i32; 3], rgb: Option<[u16; 3]>) -> Self {
        let mut record = vec![0u8; self.record_length as usize];
        for (axis, value) in xyz.iter().enumerate() {
            LittleEndian::write_i32(&mut record[axis * 4..axis * 4 + 4], *value);
        }
        let color_offset = PointFormat::from_code(self.format).and_then(|f| f.color_offset());
        if let (Some(rgb), Some(at)) = (rgb, color_offset) {
            if at + 6 <= record.len() {
                LittleEndian::write_u16_into(&rgb, &mut record[at..at + 6]);
            }
        }
        self.records.push(record);
        self
    }

    pub fn header_len(&self) -> usize {
        match self.minor {
            0..=2 => 227,
            3 => 235,
            _ => 375,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let header_len = self.header_len();
        let mut buf = vec![0u8; header_len];
        buf[0..4].copy_from_slice(b"LASF");
        buf[24] = self.major;
        buf[25] = self.minor;
        LittleEndian::write_u16(&mut buf[94..96], header_len as u16);
        LittleEndian::write_u32(&mut buf[96..100], header_len as u32);
        buf[104] = self.format;
        LittleEndian::write_u16(&mut buf[105..107], self.record_length);
        LittleEndian::write_u32(&mut buf[107..111], self.point_count);
        LittleEndian::write_f64_into(&self.scale, &mut buf[131..155]);
        LittleEndian::write_f64_into(&self.offset, &mut buf[155..179]);
        for axis in 0..3 {
            let at = 179 + axis * 16;
            LittleEndian::write_f64(&mut buf[at..at + 8], self.max[axis]);
            LittleEndian::write_f64(&mut buf[at + 8..at + 16], self.min[axis]);
        }
        if header_len >= 375 {
            LittleEndian::write_u32(&mut buf[247..251], self.extended.0);
            LittleEndian::write_u32(&mut buf[251..255], self.extended.1);
        }
        for record in &self.records {
            buf.extend_from_slice(record);
        }
        buf
    }
}
