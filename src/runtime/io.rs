//! Bit-exact binary (de)serialization (spec.md §6).
//!
//! Header layout (16 bytes, in the trie's declared byte order):
//!
//! | offset | size | field                |
//! |-------:|-----:|-----------------------|
//! | 0      | 4    | signature (`"Tri3"`)  |
//! | 4      | 2    | options                |
//! | 6      | 2    | index length           |
//! | 8      | 2    | data length            |
//! | 10     | 2    | index3 null offset     |
//! | 12     | 2    | data null offset (low) |
//! | 14     | 2    | `high_start >> 12`     |
//!
//! followed by `index` (u16 each) and then `data` (per [`ValueWidth`]), all
//! in the declared order.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    constants::{HEADER_LEN, INDEX_3_NULL_OFFSET_SENTINEL, SIGNATURE},
    value_width::{TrieData, ValueWidth},
    CodePointTrie, Error, Result, TrieType,
};

impl CodePointTrie {
    /// Serialize in the given byte order.
    pub fn serialize<B: ByteOrder>(&self, writer: &mut impl Write) -> Result<()> {
        let options: u16 =
            (self.data.width().format_code() as u16) | ((self.trie_type.format_code() as u16) << 4);
        let index3_null_offset = self.index3_null_offset.unwrap_or(INDEX_3_NULL_OFFSET_SENTINEL);
        let data_null_offset_low = self.data_null_offset.unwrap_or(0) as u16;

        writer.write_u32::<B>(SIGNATURE).map_err(io_err)?;
        writer.write_u16::<B>(options).map_err(io_err)?;
        writer
            .write_u16::<B>(self.index.len() as u16)
            .map_err(io_err)?;
        writer
            .write_u16::<B>(self.data.len() as u16)
            .map_err(io_err)?;
        writer.write_u16::<B>(index3_null_offset).map_err(io_err)?;
        writer.write_u16::<B>(data_null_offset_low).map_err(io_err)?;
        writer
            .write_u16::<B>(self.shifted12_high_start() as u16)
            .map_err(io_err)?;

        for &entry in &self.index {
            writer.write_u16::<B>(entry).map_err(io_err)?;
        }

        match &self.data {
            TrieData::Bits8(v) => writer.write_all(v).map_err(io_err)?,
            TrieData::Bits16(v) => {
                for &entry in v {
                    writer.write_u16::<B>(entry).map_err(io_err)?;
                }
            }
            TrieData::Bits32(v) => {
                for &entry in v {
                    writer.write_u32::<B>(entry).map_err(io_err)?;
                }
            }
        }

        // high_value/error_value are carried as struct fields and are not
        // separately re-derivable from the header; they live at the two
        // terminal slots already present at the end of `data`.
        Ok(())
    }

    /// Convenience wrapper for [`CodePointTrie::serialize`] in little-endian.
    pub fn serialize_le(&self, writer: &mut impl Write) -> Result<()> {
        self.serialize::<LittleEndian>(writer)
    }

    /// Convenience wrapper for [`CodePointTrie::serialize`] in big-endian.
    pub fn serialize_be(&self, writer: &mut impl Write) -> Result<()> {
        self.serialize::<BigEndian>(writer)
    }

    /// Deserialize a trie, auto-detecting byte order from the signature
    /// (spec.md §6): whichever order makes the first four bytes read back as
    /// `"Tri3"` is the order the rest of the stream is read in.
    pub fn deserialize(reader: &mut impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(io_err)?;
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidFormat("truncated header"));
        }

        if BigEndian::read_u32(&bytes[0..4]) == SIGNATURE {
            Self::read_body::<BigEndian>(&bytes)
        } else if LittleEndian::read_u32(&bytes[0..4]) == SIGNATURE {
            Self::read_body::<LittleEndian>(&bytes)
        } else {
            Err(Error::InvalidFormat("bad signature"))
        }
    }

    fn read_body<B: ByteOrder>(bytes: &[u8]) -> Result<Self> {
        let options = B::read_u16(&bytes[4..6]);
        let index_length = B::read_u16(&bytes[6..8]) as usize;
        let data_length = B::read_u16(&bytes[8..10]) as usize;
        let index3_null_offset_raw = B::read_u16(&bytes[10..12]);
        let data_null_offset_raw = B::read_u16(&bytes[12..14]);
        let shifted12_high_start = B::read_u16(&bytes[14..16]) as u32;

        let width_code = (options & 0xF) as u8;
        let type_code = ((options >> 4) & 0xF) as u8;
        if options & 0xFF00 != 0 {
            return Err(Error::InvalidFormat("reserved header bits set"));
        }
        let value_width =
            ValueWidth::from_format_code(width_code).ok_or(Error::InvalidFormat("unknown value width"))?;
        let trie_type =
            TrieType::from_format_code(type_code).ok_or(Error::InvalidFormat("unknown trie type"))?;
        if index_length == 0 {
            return Err(Error::InvalidFormat("index length is zero"));
        }

        let mut cursor = HEADER_LEN;
        let index_bytes = index_length * 2;
        if bytes.len() < cursor + index_bytes {
            return Err(Error::InvalidFormat("truncated index"));
        }
        let mut index = Vec::with_capacity(index_length);
        for chunk in bytes[cursor..cursor + index_bytes].chunks_exact(2) {
            index.push(B::read_u16(chunk));
        }
        cursor += index_bytes;

        let element_size = match value_width {
            ValueWidth::Bits8 => 1,
            ValueWidth::Bits16 => 2,
            ValueWidth::Bits32 => 4,
        };
        let data_bytes = data_length * element_size;
        if bytes.len() < cursor + data_bytes {
            return Err(Error::InvalidFormat("truncated data"));
        }
        let data = match value_width {
            ValueWidth::Bits8 => TrieData::Bits8(bytes[cursor..cursor + data_length].to_vec()),
            ValueWidth::Bits16 => TrieData::Bits16(
                bytes[cursor..cursor + data_bytes]
                    .chunks_exact(2)
                    .map(B::read_u16)
                    .collect(),
            ),
            ValueWidth::Bits32 => TrieData::Bits32(
                bytes[cursor..cursor + data_bytes]
                    .chunks_exact(4)
                    .map(B::read_u32)
                    .collect(),
            ),
        };

        if data.len() < 2 {
            return Err(Error::InvalidFormat("data array missing terminal entries"));
        }
        let high_value = data.get(data.len() - 2);
        let error_value = data.get(data.len() - 1);

        let index3_null_offset = if index3_null_offset_raw == crate::constants::INDEX_3_NULL_OFFSET_SENTINEL {
            None
        } else {
            Some(index3_null_offset_raw)
        };
        let data_null_offset = if index3_null_offset.is_none() {
            None
        } else {
            Some(data_null_offset_raw as u32)
        };

        Ok(CodePointTrie {
            trie_type,
            index,
            data,
            high_start: shifted12_high_start << 12,
            high_value,
            error_value,
            index3_null_offset,
            data_null_offset,
        })
    }
}

fn io_err(e: io::Error) -> Error {
    let _ = e;
    Error::InvalidFormat("I/O error while (de)serializing trie")
}
