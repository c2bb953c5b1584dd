//! Transition cost table
//!
//! Estimated cycle costs per command kind. The numbers are tuned estimates used
//! only to rank batch orders; load them from a config file to experiment.

use serde::{Deserialize, Serialize};

use crate::display_list::{Command, StateCommand};

/// Estimated cost of each kind of state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTiming {
    /// Full pipeline sync
    pub pipe_sync: f64,
    /// Tile or load sync
    pub minor_sync: f64,
    /// One othermode field
    pub other_mode: f64,
    /// Geometry mode set/clear pair
    pub geometry_mode: f64,
    /// Combiner setup
    pub combine: f64,
    /// Blender setup
    pub render_mode: f64,
    /// Any of the RDP colors
    pub color: f64,
    /// Texture scale state
    pub texture_state: f64,
    /// Texture image pointer
    pub texture_image: f64,
    /// Fixed part of a texture load
    pub load_block: f64,
    /// Per-byte part of a texture load
    pub load_block_per_byte: f64,
    /// Palette load per entry
    pub load_tlut_per_color: f64,
    /// Tile descriptor write
    pub set_tile: f64,
    /// Tile rectangle write
    pub set_tile_size: f64,
    /// Popping any number of matrices
    pub matrix_pop: f64,
    /// Pushing and multiplying one matrix
    pub matrix_push: f64,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            pipe_sync: 50.0,
            minor_sync: 10.0,
            other_mode: 6.0,
            geometry_mode: 8.0,
            combine: 6.0,
            render_mode: 6.0,
            color: 4.0,
            texture_state: 8.0,
            texture_image: 4.0,
            load_block: 40.0,
            load_block_per_byte: 0.125,
            load_tlut_per_color: 0.5,
            set_tile: 6.0,
            set_tile_size: 6.0,
            matrix_pop: 120.0,
            matrix_push: 300.0,
        }
    }
}

impl crate::config::Config for TransitionTiming {}

impl TransitionTiming {
    /// Estimated cost of executing one command
    pub fn cost_of(&self, command: &Command) -> f64 {
        match command {
            Command::SetGeometryMode { .. } => self.geometry_mode,
            Command::PopMatrix { .. } => self.matrix_pop,
            Command::PushMatrix { .. } => self.matrix_push,
            Command::Raw(state) => self.state_cost(state),
            Command::LoadVertices { .. }
            | Command::Triangle1(_)
            | Command::Triangle2(_, _)
            | Command::CallList(_)
            | Command::CullList { .. }
            | Command::Comment(_) => 0.0,
        }
    }

    fn state_cost(&self, command: &StateCommand) -> f64 {
        match command {
            StateCommand::PipeSync => self.pipe_sync,
            StateCommand::TileSync | StateCommand::LoadSync => self.minor_sync,
            StateCommand::SetOtherMode(_) => self.other_mode,
            StateCommand::SetCombine(_) => self.combine,
            StateCommand::SetRenderMode(_) => self.render_mode,
            StateCommand::SetPrimitiveColor(_)
            | StateCommand::SetEnvironmentColor(_)
            | StateCommand::SetFillColor(_)
            | StateCommand::SetFogColor(_)
            | StateCommand::SetBlendColor(_) => self.color,
            StateCommand::SetTexture(_) => self.texture_state,
            StateCommand::SetTextureImage(_) => self.texture_image,
            StateCommand::LoadBlock { texture, .. } => {
                self.load_block + f64::from(texture.byte_count()) * self.load_block_per_byte
            }
            StateCommand::LoadTlut { palette, .. } => f64::from(palette.color_count) * self.load_tlut_per_color,
            StateCommand::SetTile { .. } => self.set_tile,
            StateCommand::SetTileSize { .. } => self.set_tile_size,
        }
    }

    /// Cost of moving the matrix stack between two bones
    ///
    /// One pop covers any number of levels; each level pushed below the common
    /// ancestor costs a full push.
    pub fn matrix_cost(&self, pops: usize, pushes: usize) -> f64 {
        let pop = if pops > 0 { self.matrix_pop } else { 0.0 };
        pop + pushes as f64 * self.matrix_push
    }
}
