//! Material system
//!
//! Register snapshots, the library that names them, and the differ that turns
//! a pair of snapshots into the commands (or estimated cost) of moving between
//! them.

pub mod diff;
pub mod enums;
mod library;
mod state;
mod texture;
mod timing;

pub use diff::{diff, transition_cost, CostSink, TransitionSink};
pub use enums::{
    AlphaCombineSource, AlphaCompare, AlphaDither, ColorCombineSource, ColorDither, CombineKey, CycleType,
    DepthSource, GeometryMode, ImageFormat, ImageSize, OtherModeValue, OtherModes, PerspectiveMode, PipelineMode,
    TextureConvert, TextureDetail, TextureFilter, TextureLod, TextureLut,
};
pub use library::{Material, MaterialLibrary, TILE_SIZE_S_PROPERTY, TILE_SIZE_T_PROPERTY};
pub use state::{
    Color, CombineCycles, CombineMode, CoordinateParams, FlagList, MaterialState, PrimitiveColor, RenderMode,
    RenderModeCycles, TextureState, TileParams, TileSize, TileState, MAX_TILE_COUNT,
};
pub use texture::{PaletteInfo, TextureInfo};
pub use timing::TransitionTiming;
