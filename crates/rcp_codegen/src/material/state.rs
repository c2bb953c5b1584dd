//! Material state snapshot
//!
//! [`MaterialState`] mirrors every configurable register of the pipeline. Each
//! field can be unspecified (`None`, `Unknown` or an unknown flag bit); the
//! differ never emits a command for an unspecified field and the simulator
//! never overwrites its state with one.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::enums::{AlphaCombineSource, ColorCombineSource, GeometryMode, ImageFormat, ImageSize, OtherModes};
use super::texture::{PaletteInfo, TextureInfo};
use crate::display_list::{Command, StateCommand};

/// Number of tile descriptors in the rasterizer
pub const MAX_TILE_COUNT: usize = 8;

/// Geometry mode bits together with which bits are specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlagList {
    /// Values of the known bits
    pub flags: GeometryMode,
    /// Bits whose value is specified
    pub known: GeometryMode,
}

impl FlagList {
    /// Specify a bit
    pub fn set(&mut self, mode: GeometryMode, enabled: bool) {
        self.known |= mode;
        self.flags.set(mode, enabled);
    }

    /// Value of a bit, if specified
    pub fn get(&self, mode: GeometryMode) -> Option<bool> {
        self.known.contains(mode).then(|| self.flags.contains(mode))
    }

    /// Bits `self` specifies that `from` does not already hold
    pub fn delta_from(&self, from: &FlagList) -> GeometryMode {
        self.known & (!from.known | (from.flags ^ self.flags))
    }

    /// Overwrite the bits `other` specifies
    pub fn apply_from(&mut self, other: &FlagList) {
        self.flags = (self.flags & !other.known) | (other.flags & other.known);
        self.known |= other.known;
    }

    /// Whether every bit `target` specifies holds here
    pub fn satisfies(&self, target: &FlagList) -> bool {
        self.known.contains(target.known) && ((self.flags ^ target.flags) & target.known).is_empty()
    }
}

/// An 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a color
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Primitive color plus its level-of-detail parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PrimitiveColor {
    /// Color
    pub color: Color,
    /// Minimum level of detail
    pub lod_min: u8,
    /// Level-of-detail fraction
    pub lod_fraction: u8,
}

/// One combiner cycle, `(a - b) * c + d` for color and alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombineMode {
    /// Color inputs a, b, c, d
    pub color: [ColorCombineSource; 4],
    /// Alpha inputs a, b, c, d
    pub alpha: [AlphaCombineSource; 4],
}

impl CombineMode {
    /// Output the shade color
    pub const SHADE: CombineMode = CombineMode {
        color: [
            ColorCombineSource::Zero,
            ColorCombineSource::Zero,
            ColorCombineSource::Zero,
            ColorCombineSource::ShadeColor,
        ],
        alpha: [
            AlphaCombineSource::Zero,
            AlphaCombineSource::Zero,
            AlphaCombineSource::Zero,
            AlphaCombineSource::ShadeAlpha,
        ],
    };

    /// Modulate the first texel by the shade color
    pub const TEXTURE_SHADE: CombineMode = CombineMode {
        color: [
            ColorCombineSource::Texel0,
            ColorCombineSource::Zero,
            ColorCombineSource::ShadeColor,
            ColorCombineSource::Zero,
        ],
        alpha: [
            AlphaCombineSource::Zero,
            AlphaCombineSource::Zero,
            AlphaCombineSource::Zero,
            AlphaCombineSource::ShadeAlpha,
        ],
    };
}

/// Combiner configuration for both cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombineCycles {
    /// First cycle
    pub first: CombineMode,
    /// Second cycle
    pub second: CombineMode,
}

impl CombineCycles {
    /// Same combiner in both cycles
    pub fn both(mode: CombineMode) -> Self {
        Self { first: mode, second: mode }
    }
}

/// Blender configuration word for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderMode(pub u32);

/// Blender configuration for both cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RenderModeCycles {
    pub first: RenderMode,
    pub second: RenderMode,
}

/// Texture scaling and tile selection for the geometry processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureState {
    /// S scale as 0.16 fixed point
    pub scale_s: u16,
    /// T scale as 0.16 fixed point
    pub scale_t: u16,
    /// Mip levels beyond the first
    pub levels: u8,
    /// Tile used for the first level
    pub tile: u8,
    /// Whether texturing is on
    pub enabled: bool,
}

impl Default for TextureState {
    fn default() -> Self {
        Self {
            scale_s: 0xFFFF,
            scale_t: 0xFFFF,
            levels: 0,
            tile: 0,
            enabled: true,
        }
    }
}

/// Addressing of one texture axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CoordinateParams {
    /// Repeat outside the mask
    pub wrap: bool,
    /// Mirror every other repetition
    pub mirror: bool,
    /// log2 of the wrap size
    pub mask: u8,
    /// Level-of-detail shift
    pub shift: u8,
}

/// Tile descriptor fields written by a set-tile command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileParams {
    /// Texel format
    pub format: ImageFormat,
    /// Texel size
    pub size: ImageSize,
    /// Row stride in 64-bit words
    pub line: u16,
    /// Texture memory address in 64-bit words
    pub tmem: u16,
    /// Palette index for 4-bit color-indexed textures
    pub palette: u8,
    /// S axis addressing
    pub s: CoordinateParams,
    /// T axis addressing
    pub t: CoordinateParams,
}

/// Tile rectangle written by a set-tile-size command, in 10.2 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TileSize {
    pub s_offset: u16,
    pub t_offset: u16,
    pub s_limit: u16,
    pub t_limit: u16,
}

impl TileSize {
    /// Rectangle covering a whole texture
    pub fn covering(texture: &TextureInfo) -> Self {
        Self {
            s_offset: 0,
            t_offset: 0,
            s_limit: (texture.width.saturating_sub(1) * 4) as u16,
            t_limit: (texture.height.saturating_sub(1) * 4) as u16,
        }
    }
}

/// One tile descriptor together with the texture resident at its address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileState {
    /// Texture expected at `params.tmem`
    pub texture: Option<Arc<TextureInfo>>,
    /// Descriptor fields
    pub params: TileParams,
    /// Tile rectangle
    pub size: TileSize,
}

impl TileState {
    /// A tile sampling `texture` from `tmem`
    pub fn for_texture(texture: TextureInfo, tmem: u16) -> Self {
        let line = ((texture.width * texture.size.bits()).div_ceil(64)) as u16;
        Self {
            params: TileParams {
                format: texture.format,
                size: texture.size,
                line,
                tmem,
                ..Default::default()
            },
            size: TileSize::covering(&texture),
            texture: Some(Arc::new(texture)),
        }
    }
}

/// Snapshot of every configurable pipeline register
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialState {
    /// Tile descriptors
    pub tiles: [Option<TileState>; MAX_TILE_COUNT],
    /// Geometry processor texture state
    pub texture_state: Option<TextureState>,
    /// Geometry mode bits
    pub geometry_modes: FlagList,
    /// Othermode enumerations
    pub other_modes: OtherModes,
    /// Combiner configuration
    pub combine: Option<CombineCycles>,
    /// Blender configuration
    pub render_mode: Option<RenderModeCycles>,
    /// Primitive color
    pub primitive_color: Option<PrimitiveColor>,
    /// Environment color
    pub env_color: Option<Color>,
    /// Fill color
    pub fill_color: Option<Color>,
    /// Fog color
    pub fog_color: Option<Color>,
    /// Blend color
    pub blend_color: Option<Color>,
}

/// Overwrite `current` when `update` is specified
fn apply_option<T: Clone>(current: &mut Option<T>, update: &Option<T>) {
    if update.is_some() {
        current.clone_from(update);
    }
}

/// Whether `current` holds `target` when `target` is specified
fn satisfies_option<T: PartialEq>(current: &Option<T>, target: &Option<T>) -> bool {
    target.is_none() || current == target
}

/// `value` if `mask` is specified
fn restrict_option<T: Clone, U>(value: &Option<T>, mask: &Option<U>) -> Option<T> {
    mask.as_ref().and(value.clone())
}

impl MaterialState {
    /// Whether lighting is known to be on
    pub fn uses_lighting(&self) -> bool {
        self.geometry_modes.get(GeometryMode::LIGHTING) == Some(true)
    }

    /// First tile that samples a texture
    pub fn first_textured_tile(&self) -> Option<&TileState> {
        self.tiles.iter().flatten().find(|tile| tile.texture.is_some())
    }

    /// Whether `texture` is resident at `tmem` according to any tile
    pub fn is_texture_loaded(&self, texture: &TextureInfo, tmem: u16) -> bool {
        self.tiles.iter().flatten().any(|tile| {
            tile.params.tmem == tmem && tile.texture.as_deref() == Some(texture)
        })
    }

    /// Whether `palette` is resident in palette slot `index` according to any tile
    pub fn is_palette_loaded(&self, palette: &PaletteInfo, index: u8) -> bool {
        self.tiles.iter().flatten().any(|tile| {
            tile.params.palette == index
                && tile
                    .texture
                    .as_ref()
                    .and_then(|texture| texture.palette.as_deref())
                    == Some(palette)
        })
    }

    /// Overwrite every field `to` specifies, leave the rest untouched
    ///
    /// Textures `to` places in texture memory replace whatever other tiles
    /// at the same address were sampling.
    pub fn apply_from(&mut self, to: &MaterialState) {
        let resident: Vec<(u16, &Arc<TextureInfo>)> = to
            .tiles
            .iter()
            .flatten()
            .filter_map(|tile| tile.texture.as_ref().map(|texture| (tile.params.tmem, texture)))
            .collect();

        for (tile, update) in self.tiles.iter_mut().zip(&to.tiles) {
            if update.is_some() {
                apply_option(tile, update);
            } else if let Some(current) = tile {
                if let Some((_, texture)) = resident.iter().find(|(tmem, _)| *tmem == current.params.tmem) {
                    current.texture = Some(Arc::clone(texture));
                }
            }
        }
        apply_option(&mut self.texture_state, &to.texture_state);
        self.geometry_modes.apply_from(&to.geometry_modes);
        self.other_modes.apply_from(&to.other_modes);
        apply_option(&mut self.combine, &to.combine);
        apply_option(&mut self.render_mode, &to.render_mode);
        apply_option(&mut self.primitive_color, &to.primitive_color);
        apply_option(&mut self.env_color, &to.env_color);
        apply_option(&mut self.fill_color, &to.fill_color);
        apply_option(&mut self.fog_color, &to.fog_color);
        apply_option(&mut self.blend_color, &to.blend_color);
    }

    /// Whether every field `target` specifies holds in this state
    pub fn satisfies(&self, target: &MaterialState) -> bool {
        let tiles_match = self.tiles.iter().zip(&target.tiles).all(|(current, wanted)| match (current, wanted) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(current), Some(wanted)) => {
                current.params == wanted.params
                    && current.size == wanted.size
                    && (wanted.texture.is_none() || current.texture == wanted.texture)
            }
        });

        let other_modes_match = self
            .other_modes
            .values()
            .into_iter()
            .zip(target.other_modes.values())
            .all(|(current, wanted)| !wanted.is_known() || current == wanted);

        tiles_match
            && other_modes_match
            && self.geometry_modes.satisfies(&target.geometry_modes)
            && satisfies_option(&self.texture_state, &target.texture_state)
            && satisfies_option(&self.combine, &target.combine)
            && satisfies_option(&self.render_mode, &target.render_mode)
            && satisfies_option(&self.primitive_color, &target.primitive_color)
            && satisfies_option(&self.env_color, &target.env_color)
            && satisfies_option(&self.fill_color, &target.fill_color)
            && satisfies_option(&self.fog_color, &target.fog_color)
            && satisfies_option(&self.blend_color, &target.blend_color)
    }

    /// This state limited to the fields `mask` specifies
    pub fn restricted_to(&self, mask: &MaterialState) -> MaterialState {
        let mut tiles: [Option<TileState>; MAX_TILE_COUNT] = Default::default();
        for (index, tile) in tiles.iter_mut().enumerate() {
            *tile = restrict_option(&self.tiles[index], &mask.tiles[index]);
        }

        MaterialState {
            tiles,
            texture_state: restrict_option(&self.texture_state, &mask.texture_state),
            geometry_modes: FlagList {
                flags: self.geometry_modes.flags & mask.geometry_modes.known,
                known: self.geometry_modes.known & mask.geometry_modes.known,
            },
            other_modes: self.other_modes.restricted_to(&mask.other_modes),
            combine: restrict_option(&self.combine, &mask.combine),
            render_mode: restrict_option(&self.render_mode, &mask.render_mode),
            primitive_color: restrict_option(&self.primitive_color, &mask.primitive_color),
            env_color: restrict_option(&self.env_color, &mask.env_color),
            fill_color: restrict_option(&self.fill_color, &mask.fill_color),
            fog_color: restrict_option(&self.fog_color, &mask.fog_color),
            blend_color: restrict_option(&self.blend_color, &mask.blend_color),
        }
    }

    /// Execute register writes against this state
    ///
    /// Tiles sample whatever texture was last loaded at their address, so a
    /// block load updates every tile pointing at that address.
    pub fn replay<'a>(&mut self, commands: impl IntoIterator<Item = &'a Command>) {
        let mut resident: HashMap<u16, Arc<TextureInfo>> = self
            .tiles
            .iter()
            .flatten()
            .filter_map(|tile| tile.texture.clone().map(|texture| (tile.params.tmem, texture)))
            .collect();

        for command in commands {
            match command {
                Command::SetGeometryMode { clear, set } => {
                    self.geometry_modes.flags = (self.geometry_modes.flags & !*clear) | *set;
                    self.geometry_modes.known |= *clear | *set;
                }
                Command::Raw(state) => self.replay_state_command(state, &mut resident),
                _ => {}
            }
        }
    }

    fn replay_state_command(&mut self, command: &StateCommand, resident: &mut HashMap<u16, Arc<TextureInfo>>) {
        match command {
            StateCommand::SetOtherMode(value) => self.other_modes.set(*value),
            StateCommand::SetCombine(combine) => self.combine = Some(*combine),
            StateCommand::SetRenderMode(mode) => self.render_mode = Some(*mode),
            StateCommand::SetPrimitiveColor(color) => self.primitive_color = Some(*color),
            StateCommand::SetEnvironmentColor(color) => self.env_color = Some(*color),
            StateCommand::SetFillColor(color) => self.fill_color = Some(*color),
            StateCommand::SetFogColor(color) => self.fog_color = Some(*color),
            StateCommand::SetBlendColor(color) => self.blend_color = Some(*color),
            StateCommand::SetTexture(texture_state) => self.texture_state = Some(*texture_state),
            StateCommand::LoadBlock { texture, tmem } => {
                resident.insert(*tmem, Arc::clone(texture));
                for tile in self.tiles.iter_mut().flatten() {
                    if tile.params.tmem == *tmem {
                        tile.texture = Some(Arc::clone(texture));
                    }
                }
            }
            StateCommand::SetTile { tile, params } => {
                let state = self.tiles[usize::from(*tile)].get_or_insert_with(TileState::default);
                state.params = *params;
                state.texture = resident.get(&params.tmem).cloned();
            }
            StateCommand::SetTileSize { tile, size } => {
                self.tiles[usize::from(*tile)].get_or_insert_with(TileState::default).size = *size;
            }
            StateCommand::PipeSync
            | StateCommand::TileSync
            | StateCommand::LoadSync
            | StateCommand::SetTextureImage(_)
            | StateCommand::LoadTlut { .. } => {}
        }
    }
}
