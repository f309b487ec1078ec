//! EXIF metadata reader.
//!
//! An EXIF payload is a TIFF structure whose IFD0 carries the camera-level
//! tags. The only one we surface is `ImageDescription`, the caption a person
//! typed into their photo software.

mod parser;
mod tags;

pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, IFD_ENTRY_SIZE, TIFF_HEADER_SIZE};
pub use tags::{FieldType, TAG_IMAGE_DESCRIPTION};

use crate::error::MetadataError;

/// Read the `ImageDescription` tag from an EXIF payload.
///
/// The value is returned verbatim up to its NUL terminator, whitespace
/// included. Returns `Ok(None)` when the tag is absent or empty.
pub fn read_image_description(payload: &[u8]) -> Result<Option<String>, MetadataError> {
    let header = TiffHeader::parse(payload)?;
    let ifd0 = Ifd::parse(
        payload,
        header.byte_order,
        header.first_ifd_offset as usize,
    )?;

    let Some(entry) = ifd0.find(TAG_IMAGE_DESCRIPTION) else {
        return Ok(None);
    };

    match FieldType::from_u16(entry.field_type) {
        Some(field_type) if field_type.is_textual() => {}
        _ => {
            return Err(MetadataError::InvalidTagValue {
                tag: "ImageDescription",
                message: format!("expected a text type, got field type {}", entry.field_type),
            })
        }
    }

    let raw = entry.value_bytes(payload, header.byte_order, "ImageDescription")?;
    let text = match raw.iter().position(|&b| b == 0) {
        Some(nul) => &raw[..nul],
        None => raw,
    };

    let description = String::from_utf8_lossy(text).into_owned();
    if description.is_empty() {
        return Ok(None);
    }

    Ok(Some(description))
}
