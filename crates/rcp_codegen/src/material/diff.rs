//! Material state differ
//!
//! One walk over two [`MaterialState`]s drives either a command list or a cost
//! estimate, so the cost the optimizer ranks with is exactly the cost of the
//! commands the emitter later writes.

use std::sync::Arc;

use super::state::{Color, MaterialState};
use super::texture::{PaletteInfo, TextureInfo};
use super::timing::TransitionTiming;
use crate::display_list::{Command, StateCommand};

/// Receiver of the commands produced by a state walk
pub trait TransitionSink {
    /// Accept one command
    fn emit(&mut self, command: Command);
}

impl TransitionSink for Vec<Command> {
    fn emit(&mut self, command: Command) {
        self.push(command);
    }
}

/// Sums the estimated cost of every command it receives
pub struct CostSink<'a> {
    timing: &'a TransitionTiming,
    total: f64,
    count: usize,
}

impl<'a> CostSink<'a> {
    /// Create an empty sink
    pub fn new(timing: &'a TransitionTiming) -> Self {
        Self {
            timing,
            total: 0.0,
            count: 0,
        }
    }

    /// Total including the leading pipe sync when anything was emitted
    pub fn total(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total + self.timing.pipe_sync
        }
    }
}

impl TransitionSink for CostSink<'_> {
    fn emit(&mut self, command: Command) {
        self.total += self.timing.cost_of(&command);
        self.count += 1;
    }
}

/// Commands taking the pipeline from `from` to `to`
///
/// Empty when `from` already satisfies `to`; otherwise starts with a pipe sync.
pub fn diff(from: &MaterialState, to: &MaterialState) -> Vec<Command> {
    let mut commands = Vec::new();
    walk(from, to, &mut commands);

    if !commands.is_empty() {
        commands.insert(0, Command::Raw(StateCommand::PipeSync));
    }

    commands
}

/// Estimated cost of the commands [`diff`] would produce
pub fn transition_cost(from: &MaterialState, to: &MaterialState, timing: &TransitionTiming) -> f64 {
    let mut sink = CostSink::new(timing);
    walk(from, to, &mut sink);
    sink.total()
}

/// Emit the state changes in canonical order, without the leading pipe sync
pub fn walk(from: &MaterialState, to: &MaterialState, sink: &mut impl TransitionSink) {
    for (current, wanted) in from.other_modes.values().into_iter().zip(to.other_modes.values()) {
        if wanted.is_known() && current != wanted {
            sink.emit(StateCommand::SetOtherMode(wanted).into());
        }
    }

    let geometry_delta = to.geometry_modes.delta_from(&from.geometry_modes);
    if !geometry_delta.is_empty() {
        sink.emit(Command::SetGeometryMode {
            clear: geometry_delta & !to.geometry_modes.flags,
            set: geometry_delta & to.geometry_modes.flags,
        });
    }

    if let Some(combine) = to.combine {
        if from.combine != Some(combine) {
            sink.emit(StateCommand::SetCombine(combine).into());
        }
    }

    if let Some(render_mode) = to.render_mode {
        if from.render_mode != Some(render_mode) {
            sink.emit(StateCommand::SetRenderMode(render_mode).into());
        }
    }

    if let Some(color) = to.primitive_color {
        if from.primitive_color != Some(color) {
            sink.emit(StateCommand::SetPrimitiveColor(color).into());
        }
    }

    let colors = [
        (from.env_color, to.env_color, StateCommand::SetEnvironmentColor as fn(Color) -> StateCommand),
        (from.fill_color, to.fill_color, StateCommand::SetFillColor),
        (from.fog_color, to.fog_color, StateCommand::SetFogColor),
        (from.blend_color, to.blend_color, StateCommand::SetBlendColor),
    ];
    for (current, wanted, command) in colors {
        if let Some(color) = wanted {
            if current != Some(color) {
                sink.emit(command(color).into());
            }
        }
    }

    if let Some(texture_state) = to.texture_state {
        if from.texture_state != Some(texture_state) {
            sink.emit(StateCommand::SetTexture(texture_state).into());
        }
    }

    walk_tiles(from, to, sink);
}

fn walk_tiles(from: &MaterialState, to: &MaterialState, sink: &mut impl TransitionSink) {
    let mut uploaded: Vec<(&TextureInfo, u16)> = Vec::new();
    let mut uploaded_palettes: Vec<(&PaletteInfo, u8)> = Vec::new();

    for (index, (current, wanted)) in from.tiles.iter().zip(&to.tiles).enumerate() {
        let Some(wanted) = wanted else {
            continue;
        };
        let tile = index as u8;
        let tmem = wanted.params.tmem;

        if let Some(texture) = &wanted.texture {
            let resident = from.is_texture_loaded(texture, tmem) || uploaded.contains(&(texture.as_ref(), tmem));

            if !resident {
                sink.emit(StateCommand::TileSync.into());
                sink.emit(StateCommand::SetTextureImage(Arc::clone(texture)).into());
                sink.emit(StateCommand::LoadSync.into());
                sink.emit(
                    StateCommand::LoadBlock {
                        texture: Arc::clone(texture),
                        tmem,
                    }
                    .into(),
                );
                sink.emit(StateCommand::PipeSync.into());
                uploaded.push((texture.as_ref(), tmem));
            }

            if let Some(palette) = &texture.palette {
                let slot = wanted.params.palette;
                let resident = from.is_palette_loaded(palette, slot)
                    || uploaded_palettes.contains(&(palette.as_ref(), slot));

                if !resident {
                    sink.emit(StateCommand::TileSync.into());
                    sink.emit(
                        StateCommand::LoadTlut {
                            palette: Arc::clone(palette),
                            index: slot,
                        }
                        .into(),
                    );
                    sink.emit(StateCommand::PipeSync.into());
                    uploaded_palettes.push((palette.as_ref(), slot));
                }
            }
        }

        if current.as_ref().map_or(true, |current| current.params != wanted.params) {
            sink.emit(
                StateCommand::SetTile {
                    tile,
                    params: wanted.params,
                }
                .into(),
            );
        }

        if current.as_ref().map_or(true, |current| current.size != wanted.size) {
            sink.emit(
                StateCommand::SetTileSize {
                    tile,
                    size: wanted.size,
                }
                .into(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::enums::{CycleType, GeometryMode, ImageFormat, ImageSize, TextureFilter};
    use crate::material::state::{CombineCycles, CombineMode, TileState};

    fn textured(name: &str, tile: usize, tmem: u16) -> MaterialState {
        let mut state = MaterialState::default();
        let texture = TextureInfo::new(name, 32, 32, ImageFormat::Rgba, ImageSize::Bits16);
        state.tiles[tile] = Some(TileState::for_texture(texture, tmem));
        state
    }

    fn lit_shaded() -> MaterialState {
        let mut state = MaterialState {
            combine: Some(CombineCycles::both(CombineMode::SHADE)),
            env_color: Some(Color::new(255, 0, 0, 255)),
            ..Default::default()
        };
        state.geometry_modes.set(GeometryMode::LIGHTING | GeometryMode::SHADE, true);
        state.other_modes.cycle_type = CycleType::OneCycle;
        state
    }

    fn samples() -> Vec<MaterialState> {
        let mut fog = lit_shaded();
        fog.geometry_modes.set(GeometryMode::LIGHTING, false);
        fog.fog_color = Some(Color::new(10, 20, 30, 255));
        fog.other_modes.texture_filter = TextureFilter::Bilerp;

        let mut moved = textured("brick", 0, 0);
        if let Some(tile) = moved.tiles[0].as_mut() {
            tile.params.s.wrap = true;
            tile.size.s_limit = 60;
        }

        vec![
            MaterialState::default(),
            lit_shaded(),
            fog,
            textured("brick", 0, 0),
            textured("brick", 1, 0),
            textured("stone", 0, 0),
            moved,
        ]
    }

    #[test]
    fn test_diff_identity_is_empty() {
        for state in samples() {
            assert!(diff(&state, &state).is_empty(), "non-empty self diff for {state:?}");
        }
    }

    #[test]
    fn test_diff_then_replay_converges() {
        for from in samples() {
            for to in samples() {
                let mut simulated = from.clone();
                simulated.replay(&diff(&from, &to));
                assert!(simulated.satisfies(&to), "replay of diff did not converge\nfrom {from:?}\nto {to:?}");
            }
        }
    }

    #[test]
    fn test_starts_with_pipe_sync() {
        let commands = diff(&MaterialState::default(), &lit_shaded());
        assert_eq!(commands.first(), Some(&Command::Raw(StateCommand::PipeSync)));
    }

    #[test]
    fn test_unknown_fields_emit_nothing() {
        let commands = diff(&lit_shaded(), &MaterialState::default());
        assert!(commands.is_empty());
    }

    #[test]
    fn test_geometry_mode_pair() {
        let mut from = MaterialState::default();
        from.geometry_modes.set(GeometryMode::LIGHTING, true);
        from.geometry_modes.set(GeometryMode::ZBUFFER, true);

        let mut to = MaterialState::default();
        to.geometry_modes.set(GeometryMode::LIGHTING, false);
        to.geometry_modes.set(GeometryMode::ZBUFFER, true);
        to.geometry_modes.set(GeometryMode::FOG, true);

        let commands = diff(&from, &to);
        assert_eq!(
            commands[1],
            Command::SetGeometryMode {
                clear: GeometryMode::LIGHTING,
                set: GeometryMode::FOG,
            }
        );
    }

    #[test]
    fn test_upload_skipped_when_resident_in_other_tile() {
        let from = textured("brick", 1, 0);
        let to = textured("brick", 0, 0);

        let commands = diff(&from, &to);
        assert!(!commands
            .iter()
            .any(|command| matches!(command, Command::Raw(StateCommand::LoadBlock { .. }))));
        assert!(commands
            .iter()
            .any(|command| matches!(command, Command::Raw(StateCommand::SetTile { tile: 0, .. }))));
    }

    #[test]
    fn test_upload_needed_at_other_address() {
        let from = textured("brick", 0, 0);
        let to = textured("brick", 0, 256);

        let commands = diff(&from, &to);
        let loads = commands
            .iter()
            .filter(|command| matches!(command, Command::Raw(StateCommand::LoadBlock { tmem: 256, .. })))
            .count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_palette_uploaded_once() {
        let texture = TextureInfo::new("ci", 16, 16, ImageFormat::Ci, ImageSize::Bits4).with_palette(PaletteInfo {
            name: "ci_tlut".into(),
            color_count: 16,
        });
        let mut to = MaterialState::default();
        to.tiles[0] = Some(TileState::for_texture(texture.clone(), 0));
        to.tiles[1] = Some(TileState::for_texture(texture, 0));

        let commands = diff(&MaterialState::default(), &to);
        let tluts = commands
            .iter()
            .filter(|command| matches!(command, Command::Raw(StateCommand::LoadTlut { .. })))
            .count();
        let loads = commands
            .iter()
            .filter(|command| matches!(command, Command::Raw(StateCommand::LoadBlock { .. })))
            .count();
        assert_eq!(tluts, 1);
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_cost_matches_emptiness() {
        let timing = TransitionTiming::default();
        for from in samples() {
            for to in samples() {
                let cost = transition_cost(&from, &to, &timing);
                assert_eq!(cost == 0.0, diff(&from, &to).is_empty());
            }
        }
    }
}
