//! Register enumerations of the fixed-function pipeline
//!
//! Every othermode enumeration carries an `Unknown` variant. A material that
//! leaves a field `Unknown` does not care about it, and the differ never emits
//! a command for it.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Geometry mode bits controlled through the geometry mode command
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GeometryMode: u32 {
        /// Depth buffering
        const ZBUFFER = 1 << 0;
        /// Per-vertex shading
        const SHADE = 1 << 1;
        /// Texturing
        const TEXTURE_ENABLE = 1 << 2;
        /// Gouraud shading
        const SHADING_SMOOTH = 1 << 3;
        /// Cull front faces
        const CULL_FRONT = 1 << 4;
        /// Cull back faces
        const CULL_BACK = 1 << 5;
        /// Fog
        const FOG = 1 << 6;
        /// Vertex lighting; the third vertex attribute is a normal
        const LIGHTING = 1 << 7;
        /// Spherical texture coordinate generation
        const TEXTURE_GEN = 1 << 8;
        /// Linear texture coordinate generation
        const TEXTURE_GEN_LINEAR = 1 << 9;
        /// Level of detail
        const LOD = 1 << 10;
        /// Clipping
        const CLIPPING = 1 << 11;
    }
}

macro_rules! othermode_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            /// Not specified by the material
            #[default]
            Unknown,
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Whether the material specifies a value
            pub fn is_known(self) -> bool {
                self != Self::Unknown
            }
        }
    };
}

othermode_enum!(
    /// Primitive pipelining
    PipelineMode {
        /// One primitive at a time
        OnePrimitive,
        /// Pipelined primitives
        NPrimitive,
    }
);

othermode_enum!(
    /// Rasterizer cycle type
    CycleType {
        /// One cycle per pixel
        OneCycle,
        /// Two cycles per pixel
        TwoCycle,
        /// Copy mode
        Copy,
        /// Fill mode
        Fill,
    }
);

othermode_enum!(
    /// Texture perspective correction
    PerspectiveMode {
        /// Affine texture mapping
        None,
        /// Perspective-correct texture mapping
        Perspective,
    }
);

othermode_enum!(
    /// Texture detail mode
    TextureDetail {
        /// Clamp
        Clamp,
        /// Sharpen
        Sharpen,
        /// Detail
        Detail,
    }
);

othermode_enum!(
    /// Texture level-of-detail selection
    TextureLod {
        /// Use the tile given by the texture state
        Tile,
        /// Select tiles by level of detail
        Lod,
    }
);

othermode_enum!(
    /// Texture lookup table type
    TextureLut {
        /// No palette
        None,
        /// 16-bit RGBA palette
        Rgba16,
        /// 16-bit intensity-alpha palette
        Ia16,
    }
);

othermode_enum!(
    /// Texture filtering
    TextureFilter {
        /// Nearest texel
        Point,
        /// Box filter
        Average,
        /// Bilinear
        Bilerp,
    }
);

othermode_enum!(
    /// Texture color conversion
    TextureConvert {
        /// Conversion only
        Conv,
        /// Filter and conversion
        FiltConv,
        /// Filter only
        Filt,
    }
);

othermode_enum!(
    /// Chroma keying
    CombineKey {
        /// Keying off
        None,
        /// Keying on
        Key,
    }
);

othermode_enum!(
    /// Color dithering
    ColorDither {
        /// Magic square
        MagicSquare,
        /// Bayer matrix
        Bayer,
        /// Noise
        Noise,
        /// No dithering
        Disable,
    }
);

othermode_enum!(
    /// Alpha dithering
    AlphaDither {
        /// Pattern
        Pattern,
        /// Inverted pattern
        NotPattern,
        /// Noise
        Noise,
        /// No dithering
        Disable,
    }
);

othermode_enum!(
    /// Alpha compare
    AlphaCompare {
        /// Compare off
        None,
        /// Compare against the blend color alpha
        Threshold,
        /// Compare against random noise
        Dither,
    }
);

othermode_enum!(
    /// Source of the depth value
    DepthSource {
        /// Per-pixel depth
        Pixel,
        /// Primitive depth
        Primitive,
    }
);

/// One othermode register write
///
/// The diff walks these in the order of [`OtherModeValue::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum OtherModeValue {
    PipelineMode(PipelineMode),
    CycleType(CycleType),
    Perspective(PerspectiveMode),
    TextureDetail(TextureDetail),
    TextureLod(TextureLod),
    TextureLut(TextureLut),
    TextureFilter(TextureFilter),
    TextureConvert(TextureConvert),
    CombineKey(CombineKey),
    ColorDither(ColorDither),
    AlphaDither(AlphaDither),
    AlphaCompare(AlphaCompare),
    DepthSource(DepthSource),
}

impl OtherModeValue {
    /// Number of othermode fields
    pub const COUNT: usize = 13;

    /// Whether the wrapped value is known
    pub fn is_known(self) -> bool {
        match self {
            Self::PipelineMode(v) => v.is_known(),
            Self::CycleType(v) => v.is_known(),
            Self::Perspective(v) => v.is_known(),
            Self::TextureDetail(v) => v.is_known(),
            Self::TextureLod(v) => v.is_known(),
            Self::TextureLut(v) => v.is_known(),
            Self::TextureFilter(v) => v.is_known(),
            Self::TextureConvert(v) => v.is_known(),
            Self::CombineKey(v) => v.is_known(),
            Self::ColorDither(v) => v.is_known(),
            Self::AlphaDither(v) => v.is_known(),
            Self::AlphaCompare(v) => v.is_known(),
            Self::DepthSource(v) => v.is_known(),
        }
    }
}

/// Every othermode field of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct OtherModes {
    pub pipeline_mode: PipelineMode,
    pub cycle_type: CycleType,
    pub perspective: PerspectiveMode,
    pub texture_detail: TextureDetail,
    pub texture_lod: TextureLod,
    pub texture_lut: TextureLut,
    pub texture_filter: TextureFilter,
    pub texture_convert: TextureConvert,
    pub combine_key: CombineKey,
    pub color_dither: ColorDither,
    pub alpha_dither: AlphaDither,
    pub alpha_compare: AlphaCompare,
    pub depth_source: DepthSource,
}

impl OtherModes {
    /// Field values in canonical emission order
    pub fn values(&self) -> [OtherModeValue; OtherModeValue::COUNT] {
        [
            OtherModeValue::PipelineMode(self.pipeline_mode),
            OtherModeValue::CycleType(self.cycle_type),
            OtherModeValue::Perspective(self.perspective),
            OtherModeValue::TextureDetail(self.texture_detail),
            OtherModeValue::TextureLod(self.texture_lod),
            OtherModeValue::TextureLut(self.texture_lut),
            OtherModeValue::TextureFilter(self.texture_filter),
            OtherModeValue::TextureConvert(self.texture_convert),
            OtherModeValue::CombineKey(self.combine_key),
            OtherModeValue::ColorDither(self.color_dither),
            OtherModeValue::AlphaDither(self.alpha_dither),
            OtherModeValue::AlphaCompare(self.alpha_compare),
            OtherModeValue::DepthSource(self.depth_source),
        ]
    }

    /// Write one field; unknown values are ignored
    pub fn set(&mut self, value: OtherModeValue) {
        if !value.is_known() {
            return;
        }

        match value {
            OtherModeValue::PipelineMode(v) => self.pipeline_mode = v,
            OtherModeValue::CycleType(v) => self.cycle_type = v,
            OtherModeValue::Perspective(v) => self.perspective = v,
            OtherModeValue::TextureDetail(v) => self.texture_detail = v,
            OtherModeValue::TextureLod(v) => self.texture_lod = v,
            OtherModeValue::TextureLut(v) => self.texture_lut = v,
            OtherModeValue::TextureFilter(v) => self.texture_filter = v,
            OtherModeValue::TextureConvert(v) => self.texture_convert = v,
            OtherModeValue::CombineKey(v) => self.combine_key = v,
            OtherModeValue::ColorDither(v) => self.color_dither = v,
            OtherModeValue::AlphaDither(v) => self.alpha_dither = v,
            OtherModeValue::AlphaCompare(v) => self.alpha_compare = v,
            OtherModeValue::DepthSource(v) => self.depth_source = v,
        }
    }

    /// Overwrite every field `other` knows
    pub fn apply_from(&mut self, other: &OtherModes) {
        for value in other.values() {
            self.set(value);
        }
    }

    /// Keep only the fields `mask` knows, the rest become unknown
    pub fn restricted_to(&self, mask: &OtherModes) -> OtherModes {
        let mut result = OtherModes::default();
        for (value, wanted) in self.values().into_iter().zip(mask.values()) {
            if wanted.is_known() {
                result.set(value);
            }
        }
        result
    }
}

/// Color combiner inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ColorCombineSource {
    Combined,
    Texel0,
    Texel1,
    PrimitiveColor,
    ShadeColor,
    EnvironmentColor,
    KeyCenter,
    KeyScale,
    CombinedAlpha,
    Texel0Alpha,
    Texel1Alpha,
    PrimitiveAlpha,
    ShadeAlpha,
    EnvironmentAlpha,
    LodFraction,
    PrimitiveLodFraction,
    Noise,
    ConvertK4,
    ConvertK5,
    One,
    Zero,
}

/// Alpha combiner inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum AlphaCombineSource {
    CombinedAlpha,
    Texel0Alpha,
    Texel1Alpha,
    PrimitiveAlpha,
    ShadeAlpha,
    EnvironmentAlpha,
    LodFraction,
    PrimitiveLodFraction,
    One,
    Zero,
}

/// Texel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ImageFormat {
    #[default]
    Rgba,
    Yuv,
    Ci,
    Ia,
    I,
}

/// Texel size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ImageSize {
    Bits4,
    Bits8,
    #[default]
    Bits16,
    Bits32,
}

impl ImageSize {
    /// Bits per texel
    pub fn bits(self) -> u32 {
        match self {
            ImageSize::Bits4 => 4,
            ImageSize::Bits8 => 8,
            ImageSize::Bits16 => 16,
            ImageSize::Bits32 => 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_default() {
        let modes = OtherModes::default();
        assert!(modes.values().iter().all(|value| !value.is_known()));
    }

    #[test]
    fn test_apply_from_ignores_unknown() {
        let mut current = OtherModes {
            cycle_type: CycleType::TwoCycle,
            texture_filter: TextureFilter::Bilerp,
            ..Default::default()
        };
        let update = OtherModes {
            cycle_type: CycleType::OneCycle,
            ..Default::default()
        };

        current.apply_from(&update);

        assert_eq!(current.cycle_type, CycleType::OneCycle);
        assert_eq!(current.texture_filter, TextureFilter::Bilerp);
    }

    #[test]
    fn test_restricted_to() {
        let modes = OtherModes {
            cycle_type: CycleType::OneCycle,
            texture_filter: TextureFilter::Bilerp,
            ..Default::default()
        };
        let mask = OtherModes {
            texture_filter: TextureFilter::Point,
            ..Default::default()
        };

        let restricted = modes.restricted_to(&mask);
        assert_eq!(restricted.cycle_type, CycleType::Unknown);
        assert_eq!(restricted.texture_filter, TextureFilter::Bilerp);
    }
}
