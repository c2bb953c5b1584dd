//! Pipeline state simulator

use super::matrix_stack::MatrixStack;
use super::vertex_cache::VertexCache;
use crate::config::DisplayListSettings;
use crate::display_list::Command;
use crate::material::MaterialState;

/// What the coprocessor currently holds, as far as the emitted commands say
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Vertex cache contents
    pub vertex_cache: VertexCache,
    /// Pushed bone matrices
    pub matrix_stack: MatrixStack,
    /// Register state
    pub material: MaterialState,
}

impl PipelineState {
    /// Pipeline at rest: empty cache and stack, registers as `initial`
    pub fn new(settings: &DisplayListSettings, initial: MaterialState) -> Self {
        Self {
            vertex_cache: VertexCache::new(settings.vertex_cache_size),
            matrix_stack: MatrixStack::new(settings.max_matrix_depth, settings.can_pop_multiple_matrices),
            material: initial,
        }
    }

    /// Record that the registers now hold every field `to` specifies
    pub fn apply_material(&mut self, to: &MaterialState) {
        self.material.apply_from(to);
    }

    /// Execute emitted register writes against the simulated registers
    pub fn replay<'a>(&mut self, commands: impl IntoIterator<Item = &'a Command>) {
        self.material.replay(commands);
    }
}
