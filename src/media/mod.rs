//! Image format detection, dimension probing and thumbnail generation

pub mod dimensions;
pub mod format;
pub mod thumbnail;

pub use dimensions::{probe_dimensions, Dimensions};
pub use format::{detect_format, ImageFormat, IMAGE_EXTENSIONS};
pub use thumbnail::{ThumbnailFormat, ThumbnailGenerator, ThumbnailOptions, ThumbnailPreset};
