//! Thumbnail generation
//!
//! Decodes an image buffer, scales it to fit inside requested bounds
//! without ever upscaling, and re-encodes it as JPEG (lossy, with a
//! quality setting) or PNG (lossless). Decoding and scaling are CPU-bound
//! and run under spawn_blocking.

use crate::core::error::{QuireError, Result};
use crate::media::dimensions::{dimensions_of, Dimensions};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Output encoding for thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    /// Lossy output; honors the quality option
    Jpeg,
    /// Lossless output; quality is ignored
    Png,
}

/// Parameters for a single thumbnail generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1-100
    pub quality: u8,
    pub format: ThumbnailFormat,
}

/// Named parameter bundles for the common thumbnail sizes
///
/// Each preset is just a fixed set of options, not separate logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailPreset {
    /// Larger, for library grids
    Cover,
    /// Medium, for browse grids
    Grid,
    /// Small, for list rows
    Small,
    /// Full-size preview
    Large,
}

impl ThumbnailPreset {
    pub fn options(&self) -> ThumbnailOptions {
        match self {
            ThumbnailPreset::Cover => ThumbnailOptions {
                max_width: 480,
                max_height: 720,
                quality: 85,
                format: ThumbnailFormat::Jpeg,
            },
            ThumbnailPreset::Grid => ThumbnailOptions {
                max_width: 320,
                max_height: 480,
                quality: 80,
                format: ThumbnailFormat::Jpeg,
            },
            ThumbnailPreset::Small => ThumbnailOptions {
                max_width: 120,
                max_height: 180,
                quality: 75,
                format: ThumbnailFormat::Jpeg,
            },
            ThumbnailPreset::Large => ThumbnailOptions {
                max_width: 1080,
                max_height: 1920,
                quality: 90,
                format: ThumbnailFormat::Jpeg,
            },
        }
    }
}

/// Compute output dimensions that fit inside the bounds
///
/// Preserves aspect ratio, rounding to the nearest pixel. A source that
/// already fits is returned unchanged: thumbnails never upscale.
pub fn fit_dimensions(source: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    if source.width <= max_width && source.height <= max_height {
        return source;
    }
    let scale = f64::min(
        max_width as f64 / source.width as f64,
        max_height as f64 / source.height as f64,
    );
    Dimensions {
        width: ((source.width as f64 * scale).round() as u32).max(1),
        height: ((source.height as f64 * scale).round() as u32).max(1),
    }
}

/// Thumbnail generator
#[derive(Debug, Clone, Default)]
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Whether the buffer looks decodable, without decoding it
    pub fn can_decode(&self, bytes: &[u8]) -> bool {
        image::guess_format(bytes).is_ok()
    }

    /// Source dimensions: header fast path, full decode fallback
    pub fn dimensions(&self, bytes: &[u8]) -> Result<Dimensions> {
        dimensions_of(bytes, true)?
            .ok_or_else(|| QuireError::Decode("no dimensions in image".to_string()))
    }

    /// Generate a thumbnail for an image buffer
    ///
    /// Fails with `Decode` when the buffer is not a parsable image or the
    /// output cannot be encoded.
    pub async fn generate(&self, bytes: Vec<u8>, options: ThumbnailOptions) -> Result<Vec<u8>> {
        let result = tokio::task::spawn_blocking(move || generate_sync(&bytes, options)).await;
        match result {
            Ok(out) => out,
            Err(e) => Err(QuireError::Decode(format!("thumbnail task failed: {}", e))),
        }
    }

    /// Generate a thumbnail using a named preset
    pub async fn generate_preset(&self, bytes: Vec<u8>, preset: ThumbnailPreset) -> Result<Vec<u8>> {
        self.generate(bytes, preset.options()).await
    }
}

fn generate_sync(bytes: &[u8], options: ThumbnailOptions) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| QuireError::Decode(format!("image decode failed: {}", e)))?;

    let source = Dimensions {
        width: img.width(),
        height: img.height(),
    };
    let target = fit_dimensions(source, options.max_width, options.max_height);

    let scaled = if target == source {
        img
    } else {
        img.resize_exact(target.width, target.height, FilterType::Lanczos3)
    };

    let mut out = Vec::new();
    match options.format {
        ThumbnailFormat::Jpeg => {
            let quality = options.quality.clamp(1, 100);
            let rgb = scaled.to_rgb8();
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| QuireError::Decode(format!("jpeg encode failed: {}", e)))?;
        }
        ThumbnailFormat::Png => {
            scaled
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .map_err(|e| QuireError::Decode(format!("png encode failed: {}", e)))?;
        }
    }
    Ok(out)
}
