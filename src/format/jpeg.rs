//! JPEG marker scanning.
//!
//! A JPEG stream is a sequence of marker segments. Every segment before the
//! entropy-coded scan has the shape `FF xx <u16 BE length> <payload>`, where
//! the length counts itself but not the marker. We walk these segments until
//! the first Start Of Scan, looking for the EXIF APP1 segment.

use crate::error::MetadataError;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker code
pub const EOI: u8 = 0xD9;

/// Start Of Scan marker code
pub const SOS: u8 = 0xDA;

/// Application segment 1 (EXIF / XMP) marker code
pub const APP1: u8 = 0xE1;

/// Temporary marker used in arithmetic coding, no payload
const TEM: u8 = 0x01;

/// Identifier that opens an EXIF APP1 payload
pub const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Check if data starts with the JPEG SOI marker.
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0..2] == SOI
}

/// Locate the TIFF-structured payload of the first EXIF APP1 segment.
///
/// Returns `Ok(None)` when the stream reaches its scan data without an EXIF
/// segment. Scanning never looks past SOS, so the cost is bounded by the
/// header segments.
pub fn find_exif_payload(data: &[u8]) -> Result<Option<&[u8]>, MetadataError> {
    if !is_jpeg(data) {
        return Err(MetadataError::NotJpeg);
    }

    let mut pos = 2;
    loop {
        // Fill bytes: any number of 0xFF may precede a marker
        while pos + 1 < data.len() && data[pos] == 0xFF && data[pos + 1] == 0xFF {
            pos += 1;
        }

        if pos + 2 > data.len() {
            return Err(MetadataError::Truncated {
                offset: pos,
                needed: 2,
                available: data.len().saturating_sub(pos),
            });
        }
        if data[pos] != 0xFF {
            return Err(MetadataError::InvalidMarker { offset: pos });
        }

        let marker = data[pos + 1];
        pos += 2;

        match marker {
            EOI | SOS => return Ok(None),
            // Standalone markers carry no length field
            TEM | 0xD0..=0xD7 => continue,
            _ => {}
        }

        if pos + 2 > data.len() {
            return Err(MetadataError::Truncated {
                offset: pos,
                needed: 2,
                available: data.len().saturating_sub(pos),
            });
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        if length < 2 {
            return Err(MetadataError::InvalidSegmentLength {
                offset: pos,
                length,
            });
        }

        let end = pos + length;
        if end > data.len() {
            return Err(MetadataError::Truncated {
                offset: pos,
                needed: length,
                available: data.len() - pos,
            });
        }

        let payload = &data[pos + 2..end];
        if marker == APP1 && payload.starts_with(EXIF_HEADER) {
            return Ok(Some(&payload[EXIF_HEADER.len()..]));
        }

        pos = end;
    }
}
