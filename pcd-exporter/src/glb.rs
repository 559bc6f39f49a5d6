//! The binary glTF container.

use std::io::{self, Write};

use byteorder::{ByteOrder as _, LittleEndian, WriteBytesExt as _};

const MAGIC: &[u8; 4] = b"glTF";
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

fn padded(len: usize) -> usize {
    len.div_ceil(4) * 4
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glb {
    pub json: Vec<u8>,
    pub bin: Option<Vec<u8>>,
}

impl Glb {
    /// Size of the container once written.
    pub fn byte_length(&self) -> usize {
        let mut total = HEADER_LEN + CHUNK_HEADER_LEN + padded(self.json.len());
        if let Some(bin) = &self.bin {
            total += CHUNK_HEADER_LEN + padded(bin.len());
        }
        total
    }

    pub fn to_writer<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let total = u32::try_from(self.byte_length())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "glb exceeds 4 GiB"))?;

        writer.write_all(MAGIC)?;
        writer.write_u32::<LittleEndian>(VERSION)?;
        writer.write_u32::<LittleEndian>(total)?;

        // JSON is padded with spaces, BIN with zeros
        let json_len = padded(self.json.len());
        writer.write_u32::<LittleEndian>(json_len as u32)?;
        writer.write_u32::<LittleEndian>(CHUNK_JSON)?;
        writer.write_all(&self.json)?;
        writer.write_all(&b"   "[..json_len - self.json.len()])?;

        if let Some(bin) = &self.bin {
            let bin_len = padded(bin.len());
            writer.write_u32::<LittleEndian>(bin_len as u32)?;
            writer.write_u32::<LittleEndian>(CHUNK_BIN)?;
            writer.write_all(bin)?;
            writer.write_all(&[0u8; 3][..bin_len - bin.len()])?;
        }
        Ok(())
    }

    /// Splits a container back into its chunks.
    pub fn from_slice(data: &[u8]) -> io::Result<Glb> {
        let invalid = |msg: &str| io::Error::new(io::ErrorKind::InvalidData, msg.to_string());
        if data.len() < HEADER_LEN || &data[0..4] != MAGIC {
            return Err(invalid("not a binary glTF"));
        }
        if LittleEndian::read_u32(&data[4..8]) != VERSION {
            return Err(invalid("unsupported glTF container version"));
        }
        let total = LittleEndian::read_u32(&data[8..12]) as usize;
        if total > data.len() {
            return Err(invalid("truncated glTF container"));
        }

        let mut chunks = Vec::new();
        let mut pos = HEADER_LEN;
        while pos + CHUNK_HEADER_LEN <= total {
            let len = LittleEndian::read_u32(&data[pos..pos + 4]) as usize;
            let kind = LittleEndian::read_u32(&data[pos + 4..pos + 8]);
            let start = pos + CHUNK_HEADER_LEN;
            let end = start
                .checked_add(len)
                .filter(|&end| end <= total)
                .ok_or_else(|| invalid("chunk runs past the container"))?;
            chunks.push((kind, &data[start..end]));
            pos = end;
        }

        let json = match chunks.first() {
            Some((CHUNK_JSON, json)) => json.to_vec(),
            _ => return Err(invalid("first chunk is not JSON")),
        };
        let bin = chunks
            .iter()
            .find(|(kind, _)| *kind == CHUNK_BIN)
            .map(|(_, bin)| bin.to_vec());
        Ok(Glb { json, bin })
    }
}
