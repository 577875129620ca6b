//! Minimal EXIF rewriting for carrying capture metadata into print JPEGs.
//!
//! Decoders hand us the source EXIF as a raw TIFF structure. Before it goes
//! into the output two things in IFD0 must change:
//! - Orientation (0x0112) becomes 1: the pixels were already rotated, and a
//!   stale tag would make viewers rotate them a second time.
//! - XResolution/YResolution (0x011A/0x011B) and ResolutionUnit (0x0128)
//!   are rewritten to the print DPI, so they agree with the JFIF density.
//!
//! Only tags that already exist are patched in place; nothing is added or
//! moved, so every other offset in the block stays valid.
//!
//! For JPEG output the block is wrapped in an APP1 segment and spliced in
//! right after SOI (and after JFIF APP0 when present).

/// `Exif\0\0` prefix of an APP1 payload.
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest payload a JPEG marker segment can carry (length field is u16 and
/// counts itself).
const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

const TAG_ORIENTATION: u16 = 0x0112;
const TAG_X_RESOLUTION: u16 = 0x011A;
const TAG_Y_RESOLUTION: u16 = 0x011B;
const TAG_RESOLUTION_UNIT: u16 = 0x0128;

const TYPE_SHORT: u16 = 3;
const TYPE_RATIONAL: u16 = 5;

/// ResolutionUnit value for inches.
const UNIT_INCH: u16 = 2;

/// Drop an `Exif\0\0` prefix if a decoder left it on.
pub fn strip_exif_header(data: &[u8]) -> &[u8] {
    data.strip_prefix(EXIF_HEADER).unwrap_or(data)
}

// ---------------------------------------------------------------------------
// TIFF: patch IFD0 in place
// ---------------------------------------------------------------------------

/// Byte-order aware view over a TIFF block.
struct Tiff<'a> {
    data: &'a mut [u8],
    big_endian: bool,
}

impl Tiff<'_> {
    fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    }

    fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    fn write_u16(&mut self, offset: usize, value: u16) -> Option<()> {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.data.get_mut(offset..offset + 2)?.copy_from_slice(&bytes);
        Some(())
    }

    fn write_u32(&mut self, offset: usize, value: u32) -> Option<()> {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.data.get_mut(offset..offset + 4)?.copy_from_slice(&bytes);
        Some(())
    }
}

/// Rewrite orientation and resolution tags of a TIFF-structured EXIF block.
///
/// Returns `None` if the block is not a well-formed TIFF header + IFD0; the
/// caller then drops the metadata rather than writing something broken.
pub fn normalize_for_print(exif: &[u8], dpi: u32) -> Option<Vec<u8>> {
    let mut data = strip_exif_header(exif).to_vec();
    let big_endian = match data.get(0..2)? {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };
    let mut tiff = Tiff {
        data: &mut data,
        big_endian,
    };

    // TIFF magic (42)
    if tiff.read_u16(2)? != 42 {
        return None;
    }

    let ifd0 = tiff.read_u32(4)? as usize;
    let entry_count = tiff.read_u16(ifd0)? as usize;
    let entries_start = ifd0 + 2;
    if entries_start + entry_count * 12 > tiff.data.len() {
        return None;
    }

    for i in 0..entry_count {
        let entry = entries_start + i * 12;
        let tag = tiff.read_u16(entry)?;
        let typ = tiff.read_u16(entry + 2)?;
        let count = tiff.read_u32(entry + 4)?;

        match (tag, typ) {
            (TAG_ORIENTATION, TYPE_SHORT) if count >= 1 => tiff.write_u16(entry + 8, 1)?,
            (TAG_RESOLUTION_UNIT, TYPE_SHORT) if count >= 1 => {
                tiff.write_u16(entry + 8, UNIT_INCH)?
            }
            (TAG_X_RESOLUTION | TAG_Y_RESOLUTION, TYPE_RATIONAL) if count >= 1 => {
                // Rationals never fit the 4-byte inline field
                let value_offset = tiff.read_u32(entry + 8)? as usize;
                tiff.write_u32(value_offset, dpi)?;
                tiff.write_u32(value_offset + 4, 1)?;
            }
            _ => {}
        }
    }

    Some(data)
}

// ---------------------------------------------------------------------------
// JPEG: splice an APP1 segment
// ---------------------------------------------------------------------------

/// Insert `exif` as an APP1 segment into an encoded JPEG.
///
/// Returns `None` if `jpeg` does not start with SOI or the block does not
/// fit in a single segment.
pub fn embed_in_jpeg(jpeg: &[u8], exif: &[u8]) -> Option<Vec<u8>> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let tiff = strip_exif_header(exif);
    let payload_len = EXIF_HEADER.len() + tiff.len();
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return None;
    }

    // Keep JFIF APP0 first when the encoder wrote one
    let mut insert_at = 2;
    if jpeg.get(2..4) == Some(&[0xFF, 0xE0]) {
        let len = u16::from_be_bytes([*jpeg.get(4)?, *jpeg.get(5)?]) as usize;
        insert_at = 4 + len;
        if insert_at > jpeg.len() {
            return None;
        }
    }

    let mut out = Vec::with_capacity(jpeg.len() + payload_len + 4);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[insert_at..]);
    Some(out)
}

/// Find the EXIF block (TIFF bytes, header stripped) of an encoded JPEG.
///
/// Walks marker segments up to SOS.
pub fn find_in_jpeg(jpeg: &[u8]) -> Option<&[u8]> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= jpeg.len() {
        if jpeg[pos] != 0xFF {
            return None;
        }
        let marker = jpeg[pos + 1];
        // SOS (0xDA): entropy-coded data follows
        if marker == 0xDA {
            break;
        }
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        let seg_end = (pos + 2 + len).min(jpeg.len());
        let segment = jpeg.get(pos + 4..seg_end)?;
        if marker == 0xE1 && segment.starts_with(EXIF_HEADER) {
            return Some(&segment[EXIF_HEADER.len()..]);
        }
        pos += 2 + len;
    }
    None
}
