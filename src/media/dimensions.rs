//! Image dimension probing
//!
//! Two-tier extraction: a fast path reads format headers (PNG IHDR, JPEG
//! SOF, GIF logical screen, WebP VP8 chunks) without decoding pixel data.
//! A full decode is available as an explicit fallback only; it is far too
//! expensive to run for every page of every archive.

use crate::core::error::{QuireError, Result};
use crate::media::format::{detect_format, ImageFormat};

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Probe dimensions from format headers without decoding
///
/// Returns `None` when the header is truncated, malformed, or the format
/// has no cheap header path.
pub fn probe_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    match detect_format(bytes)? {
        ImageFormat::Png => png_dimensions(bytes),
        ImageFormat::Jpeg => jpeg_dimensions(bytes),
        ImageFormat::Gif => gif_dimensions(bytes),
        ImageFormat::Webp => webp_dimensions(bytes),
        ImageFormat::Bmp => bmp_dimensions(bytes),
    }
}

/// Probe dimensions with an optional full-decode fallback
///
/// The fast path runs first; when it is inconclusive and `full_decode` is
/// set, the image is decoded completely. Fails with `Decode` only when the
/// fallback was requested and the bytes are unparsable.
pub fn dimensions_of(bytes: &[u8], full_decode: bool) -> Result<Option<Dimensions>> {
    if let Some(dims) = probe_dimensions(bytes) {
        return Ok(Some(dims));
    }
    if !full_decode {
        return Ok(None);
    }
    let img = image::load_from_memory(bytes)
        .map_err(|e| QuireError::Decode(format!("full decode failed: {}", e)))?;
    Ok(Some(Dimensions {
        width: img.width(),
        height: img.height(),
    }))
}

/// PNG: IHDR is the first chunk, width/height at fixed offsets
fn png_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
        return None;
    }
    Some(Dimensions {
        width: u32::from_be_bytes(bytes[16..20].try_into().ok()?),
        height: u32::from_be_bytes(bytes[20..24].try_into().ok()?),
    })
}

/// JPEG: walk the marker segments until a start-of-frame carries the size
fn jpeg_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let mut pos = 2usize;
    while pos + 9 <= bytes.len() {
        if bytes[pos] != 0xFF {
            // Not positioned at a marker: bail rather than guess
            return None;
        }
        let marker = bytes[pos + 1];
        // Padding bytes between markers
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Standalone markers without a length field
        if (0xD0..=0xD9).contains(&marker) {
            pos += 2;
            continue;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if length < 2 {
            return None;
        }
        // SOF0..SOF15 carry dimensions, except DHT/JPG/DAC
        let is_sof = (0xC0..=0xCF).contains(&marker)
            && marker != 0xC4
            && marker != 0xC8
            && marker != 0xCC;
        if is_sof {
            if pos + 9 > bytes.len() {
                return None;
            }
            let height = u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]]) as u32;
            let width = u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]]) as u32;
            return Some(Dimensions { width, height });
        }
        pos += 2 + length;
    }
    None
}

/// GIF: logical screen descriptor right after the signature
fn gif_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.len() < 10 {
        return None;
    }
    Some(Dimensions {
        width: u16::from_le_bytes([bytes[6], bytes[7]]) as u32,
        height: u16::from_le_bytes([bytes[8], bytes[9]]) as u32,
    })
}

/// WebP: VP8/VP8L/VP8X chunk headers
fn webp_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.len() < 30 {
        return None;
    }
    match &bytes[12..16] {
        b"VP8 " => {
            // Lossy: frame tag at offset 20, sizes are 14-bit little-endian
            let width = u16::from_le_bytes([bytes[26], bytes[27]]) & 0x3FFF;
            let height = u16::from_le_bytes([bytes[28], bytes[29]]) & 0x3FFF;
            Some(Dimensions {
                width: width as u32,
                height: height as u32,
            })
        }
        b"VP8L" => {
            // Lossless: 14-bit sizes packed after the signature byte
            if bytes[20] != 0x2F {
                return None;
            }
            let b = [bytes[21], bytes[22], bytes[23], bytes[24]];
            let packed = u32::from_le_bytes(b);
            let width = (packed & 0x3FFF) + 1;
            let height = ((packed >> 14) & 0x3FFF) + 1;
            Some(Dimensions { width, height })
        }
        b"VP8X" => {
            // Extended: 24-bit sizes minus one at offset 24
            let width = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], 0]) + 1;
            let height = u32::from_le_bytes([bytes[27], bytes[28], bytes[29], 0]) + 1;
            Some(Dimensions { width, height })
        }
        _ => None,
    }
}

/// BMP: BITMAPINFOHEADER width/height at fixed offsets
fn bmp_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.len() < 26 {
        return None;
    }
    let width = i32::from_le_bytes(bytes[18..22].try_into().ok()?);
    let height = i32::from_le_bytes(bytes[22..26].try_into().ok()?);
    Some(Dimensions {
        width: width.unsigned_abs(),
        height: height.unsigned_abs(),
    })
}

/// Minimal valid PNG header for a given size, for tests across the crate
#[cfg(test)]
pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes
}
