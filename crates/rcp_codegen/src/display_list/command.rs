//! Display list commands
//!
//! A closed set of variants. The serializer matches on them exhaustively to
//! produce macro text or binary words.

use std::sync::Arc;

use serde::Serialize;

use crate::foundation::collections::VertexBufferId;
use crate::material::{
    Color, CombineCycles, GeometryMode, OtherModeValue, PaletteInfo, PrimitiveColor, RenderModeCycles, TextureInfo,
    TextureState, TileParams, TileSize,
};
use crate::skeleton::BoneId;

/// A single display list command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    /// Copy vertices from a buffer into consecutive cache slots
    LoadVertices {
        /// Source buffer
        buffer: VertexBufferId,
        /// First vertex in the buffer
        source_offset: u32,
        /// Number of vertices
        count: u32,
        /// First destination slot
        first_slot: u32,
    },
    /// Draw one triangle from cache slots
    Triangle1([u8; 3]),
    /// Draw two triangles from cache slots
    Triangle2([u8; 3], [u8; 3]),
    /// Multiply a bone's matrix onto the stack
    PushMatrix {
        /// Bone whose matrix is pushed
        bone: BoneId,
    },
    /// Pop matrices off the stack
    PopMatrix {
        /// Number of matrices removed
        count: usize,
    },
    /// Call another display list by name
    CallList(String),
    /// Clear then set geometry mode bits
    SetGeometryMode {
        /// Bits turned off
        clear: GeometryMode,
        /// Bits turned on
        set: GeometryMode,
    },
    /// End the list early when the first cache slots are off screen
    CullList {
        /// Number of slots holding the bounding volume
        vertex_count: u32,
    },
    /// Annotation for the human reading the output
    Comment(String),
    /// Register write produced by the material differ
    Raw(StateCommand),
}

impl Command {
    /// Number of triangles drawn by this command
    pub fn triangle_count(&self) -> usize {
        match self {
            Command::Triangle1(_) => 1,
            Command::Triangle2(_, _) => 2,
            _ => 0,
        }
    }

    /// Whether the command touches the matrix stack
    pub fn is_matrix(&self) -> bool {
        matches!(self, Command::PushMatrix { .. } | Command::PopMatrix { .. })
    }
}

impl From<StateCommand> for Command {
    fn from(command: StateCommand) -> Self {
        Command::Raw(command)
    }
}

/// A rasterizer register write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub enum StateCommand {
    PipeSync,
    TileSync,
    LoadSync,
    SetOtherMode(OtherModeValue),
    SetCombine(CombineCycles),
    SetRenderMode(RenderModeCycles),
    SetPrimitiveColor(PrimitiveColor),
    SetEnvironmentColor(Color),
    SetFillColor(Color),
    SetFogColor(Color),
    SetBlendColor(Color),
    SetTexture(TextureState),
    /// Point the loader at an image
    SetTextureImage(Arc<TextureInfo>),
    /// Copy the image set by the last texture image command into texture memory
    LoadBlock {
        texture: Arc<TextureInfo>,
        tmem: u16,
    },
    /// Copy a palette into palette slot `index`
    LoadTlut {
        palette: Arc<PaletteInfo>,
        index: u8,
    },
    SetTile {
        tile: u8,
        params: TileParams,
    },
    SetTileSize {
        tile: u8,
        size: TileSize,
    },
}
