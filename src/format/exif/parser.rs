//! TIFF structure parsing for EXIF payloads.
//!
//! All offsets inside an EXIF payload are relative to the start of its TIFF
//! header, so the payload slice is treated as a standalone TIFF file.
//!
//! # Header (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to IFD0
//! ```
//!
//! # IFD entry (12 bytes)
//! ```text
//! Bytes 0-1: Tag
//! Bytes 2-3: Field type
//! Bytes 4-7: Count
//! Bytes 8-11: Value (if it fits in 4 bytes) or offset to the value
//! ```

use crate::error::MetadataError;

use super::tags::FieldType;

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for TIFF
const VERSION_TIFF: u16 = 42;

/// Size of the TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes
pub const IFD_ENTRY_SIZE: usize = 12;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) declared by the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 at `offset`, failing if the data is too short.
    #[inline]
    pub fn read_u16(self, data: &[u8], offset: usize) -> Result<u16, MetadataError> {
        let bytes: [u8; 2] = take(data, offset, 2)?
            .try_into()
            .map_err(|_| truncated(data, offset, 2))?;
        Ok(match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
        })
    }

    /// Read a u32 at `offset`, failing if the data is too short.
    #[inline]
    pub fn read_u32(self, data: &[u8], offset: usize) -> Result<u32, MetadataError> {
        let bytes: [u8; 4] = take(data, offset, 4)?
            .try_into()
            .map_err(|_| truncated(data, offset, 4))?;
        Ok(match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
        })
    }
}

/// Borrow `len` bytes at `offset` with bounds checking.
fn take(data: &[u8], offset: usize, len: usize) -> Result<&[u8], MetadataError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| truncated(data, offset, len))
}

fn truncated(data: &[u8], offset: usize, needed: usize) -> MetadataError {
    MetadataError::Truncated {
        offset,
        needed,
        available: data.len().saturating_sub(offset),
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF header of an EXIF payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the payload
    pub byte_order: ByteOrder,

    /// Offset to IFD0, relative to the header start
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse the header at the start of an EXIF payload.
    ///
    /// # Errors
    /// - `Truncated` if fewer than 8 bytes are available
    /// - `InvalidMagic` if the byte order bytes are not II or MM
    /// - `InvalidVersion` if the version is not 42 (EXIF never uses BigTIFF)
    /// - `InvalidIfdOffset` if IFD0 lies outside the payload
    pub fn parse(data: &[u8]) -> Result<Self, MetadataError> {
        if data.len() < TIFF_HEADER_SIZE {
            return Err(truncated(data, 0, TIFF_HEADER_SIZE));
        }

        let magic = u16::from_le_bytes([data[0], data[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(MetadataError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(data, 2)?;
        if version != VERSION_TIFF {
            return Err(MetadataError::InvalidVersion(version));
        }

        let first_ifd_offset = byte_order.read_u32(data, 4)?;
        if (first_ifd_offset as usize) < TIFF_HEADER_SIZE
            || first_ifd_offset as usize >= data.len()
        {
            return Err(MetadataError::InvalidIfdOffset(first_ifd_offset as u64));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }
}

// =============================================================================
// IFD
// =============================================================================

/// A single IFD entry with its raw value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag ID
    pub tag: u16,

    /// Raw field type; unknown types are kept and rejected on read
    pub field_type: u16,

    /// Number of values
    pub count: u32,

    /// The 4-byte value/offset field, as stored
    pub value_field: [u8; 4],
}

impl IfdEntry {
    /// Resolve the bytes holding this entry's value.
    ///
    /// Values up to 4 bytes are stored inline; larger ones live at the
    /// offset held in the value field.
    pub fn value_bytes<'a>(
        &'a self,
        data: &'a [u8],
        byte_order: ByteOrder,
        tag_name: &'static str,
    ) -> Result<&'a [u8], MetadataError> {
        let field_type =
            FieldType::from_u16(self.field_type).ok_or(MetadataError::InvalidTagValue {
                tag: tag_name,
                message: format!("unknown field type {}", self.field_type),
            })?;

        let size = (self.count as usize)
            .checked_mul(field_type.size_in_bytes())
            .ok_or(MetadataError::InvalidTagValue {
                tag: tag_name,
                message: format!("count {} overflows", self.count),
            })?;

        if size <= FieldType::INLINE_THRESHOLD {
            return Ok(&self.value_field[..size]);
        }

        let offset = byte_order.read_u32(&self.value_field, 0)? as usize;
        take(data, offset, size)
    }
}

/// An Image File Directory: the list of entries at one offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Entries in file order
    pub entries: Vec<IfdEntry>,
}

impl Ifd {
    /// Parse the IFD at `offset`.
    pub fn parse(data: &[u8], byte_order: ByteOrder, offset: usize) -> Result<Self, MetadataError> {
        let count = byte_order.read_u16(data, offset)? as usize;
        let entries_start = offset + 2;

        // Validate the whole table up front so a bogus count fails fast
        take(data, entries_start, count * IFD_ENTRY_SIZE)?;

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = entries_start + i * IFD_ENTRY_SIZE;
            let mut value_field = [0u8; 4];
            value_field.copy_from_slice(take(data, at + 8, 4)?);

            entries.push(IfdEntry {
                tag: byte_order.read_u16(data, at)?,
                field_type: byte_order.read_u16(data, at + 2)?,
                count: byte_order.read_u32(data, at + 4)?,
                value_field,
            });
        }

        Ok(Ifd { entries })
    }

    /// Find the first entry with the given tag.
    pub fn find(&self, tag: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|entry| entry.tag == tag)
    }
}

// =============================================================================
// Tests
// =============================================================================
