//! Texture metadata referenced by tiles
//!
//! Pixel data is encoded elsewhere; the compiler only needs enough to decide
//! whether an upload is redundant and how large it is.

use serde::{Deserialize, Serialize};

use super::enums::{ImageFormat, ImageSize};

/// A color lookup table used by color-indexed textures
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaletteInfo {
    /// Symbol the serializer uses for the palette data
    pub name: String,
    /// Number of palette entries
    pub color_count: u16,
}

/// An encoded texture image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureInfo {
    /// Symbol the serializer uses for the image data
    pub name: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Texel format
    pub format: ImageFormat,
    /// Texel size
    pub size: ImageSize,
    /// Palette for color-indexed formats
    pub palette: Option<std::sync::Arc<PaletteInfo>>,
}

impl TextureInfo {
    /// Create a texture without a palette
    pub fn new(name: impl Into<String>, width: u32, height: u32, format: ImageFormat, size: ImageSize) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            size,
            palette: None,
        }
    }

    /// Attach a palette
    pub fn with_palette(mut self, palette: PaletteInfo) -> Self {
        self.palette = Some(std::sync::Arc::new(palette));
        self
    }

    /// Number of texels
    pub fn texel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Size of the image in texture memory
    pub fn byte_count(&self) -> u32 {
        (self.texel_count() * self.size.bits()).div_ceil(8)
    }
}
