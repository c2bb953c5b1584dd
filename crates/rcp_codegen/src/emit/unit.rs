//! Compilation of one output unit
//!
//! A unit is one display list: its batches are walked in order against a
//! fresh [`PipelineState`], material transitions and geometry are appended,
//! and the list ends with the pipeline back at rest.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;

use super::culling::{combined_bounds, culling_buffer, emit_culling_prologue};
use super::geometry::GeometryEmitter;
use super::materials::SharedMaterials;
use crate::batch::RenderBatch;
use crate::config::DisplayListSettings;
use crate::display_list::{Command, DisplayList};
use crate::error::{CodegenError, CodegenResult, Diagnostics};
use crate::foundation::collections::{MeshId, VertexBufferId};
use crate::geometry::{SkinnedMesh, VertexBuffer, VertexBufferBuilder, VertexType};
use crate::material::{diff, MaterialState};
use crate::pipeline::PipelineState;
use crate::scene::Scene;

/// One compiled display list with the vertex data it references
#[derive(Debug, Clone, Serialize)]
pub struct CompiledUnit {
    /// The generated commands
    pub display_list: DisplayList,
    /// Buffers referenced by load commands, in first-use order
    pub vertex_buffers: Vec<VertexBuffer>,
    /// Bounding box corners loaded by the culling prologue
    pub culling_buffer: Option<VertexBuffer>,
}

impl CompiledUnit {
    /// Buffer by id, including the culling buffer
    pub fn buffer(&self, id: VertexBufferId) -> Option<&VertexBuffer> {
        self.vertex_buffers
            .iter()
            .chain(self.culling_buffer.as_ref())
            .find(|buffer| buffer.id == id)
    }
}

/// Hands out vertex buffer ids unique across an export
#[derive(Debug, Default)]
pub struct BufferIds {
    next: u32,
}

impl BufferIds {
    /// Reserve the next id
    pub fn next_id(&mut self) -> VertexBufferId {
        let id = VertexBufferId(self.next);
        self.next += 1;
        id
    }
}

/// Shared inputs for compiling the units of one export
pub struct UnitCompiler<'a> {
    /// Scene being exported
    pub scene: &'a Scene,
    /// Meshes with automatic texture coordinates applied, indexed by mesh id
    pub meshes: &'a [Cow<'a, SkinnedMesh>],
    /// Export settings
    pub settings: &'a DisplayListSettings,
    /// State of the pipeline at rest
    pub default_state: &'a MaterialState,
    /// Materials written as standalone lists
    pub shared: &'a SharedMaterials,
}

impl UnitCompiler<'_> {
    fn mesh(&self, id: MeshId) -> CodegenResult<&SkinnedMesh> {
        self.meshes
            .get(id.0)
            .map(|mesh| &**mesh)
            .ok_or(CodegenError::UnknownMesh(id))
    }

    /// Compile ordered batches into a display list named `name`
    pub fn compile(
        &self,
        name: &str,
        batches: &[RenderBatch],
        ids: &mut BufferIds,
        diagnostics: &mut Diagnostics,
    ) -> CodegenResult<CompiledUnit> {
        let builder = VertexBufferBuilder::new(self.settings);
        let geometry = GeometryEmitter::new(&self.scene.hierarchy, self.settings.has_tri2);

        let mut state = PipelineState::new(self.settings, self.default_state.clone());
        let mut output = DisplayList::new(name);
        let mut vertex_buffers: Vec<VertexBuffer> = Vec::new();
        let mut buffer_for: HashMap<(MeshId, VertexType), VertexBufferId> = HashMap::new();

        let culling = if self.settings.include_culling {
            let mut unit_meshes = Vec::new();
            for id in batches.iter().filter_map(|batch| batch.mesh) {
                unit_meshes.push(self.mesh(id)?);
            }

            combined_bounds(unit_meshes).map(|bounds| {
                let buffer = culling_buffer(ids.next_id(), name, bounds, &builder, diagnostics);
                emit_culling_prologue(&mut state, self.default_state, buffer.id, &mut output);
                buffer
            })
        } else {
            None
        };

        for batch in batches {
            let Some(mesh_id) = batch.mesh else {
                continue;
            };
            let mesh = self.mesh(mesh_id)?;

            self.emit_material(batch, &mut state, &mut output);

            let vertex_type = if state.material.uses_lighting() {
                VertexType::Normal
            } else {
                VertexType::Color
            };

            let buffer = match buffer_for.get(&(mesh_id, vertex_type)) {
                Some(&id) => id,
                None => {
                    let texture_size = state
                        .material
                        .first_textured_tile()
                        .and_then(|tile| tile.texture.as_ref())
                        .map(|texture| (texture.width, texture.height));

                    let built = builder.build(
                        ids.next_id(),
                        Some(mesh_id),
                        mesh,
                        vertex_type,
                        texture_size,
                        diagnostics,
                    );
                    let id = built.id;
                    buffer_for.insert((mesh_id, vertex_type), id);
                    vertex_buffers.push(built);
                    id
                }
            };

            geometry.emit_batch(&mut state, mesh, batch.bone_pair, buffer, &mut output)?;
        }

        state
            .matrix_stack
            .traverse_to_bone(&self.scene.hierarchy, None, &mut output)?;

        let restore = diff(&state.material, self.default_state);
        state.replay(&restore);
        output.extend(restore);

        log::info!(
            "Compiled {}: {} commands, {} triangles, {} vertex buffers",
            name,
            output.len(),
            output.triangle_count(),
            vertex_buffers.len()
        );

        Ok(CompiledUnit {
            display_list: output,
            vertex_buffers,
            culling_buffer: culling,
        })
    }

    /// Switch the registers to the batch's material
    ///
    /// Unresolved materials emit nothing and the batch inherits the current
    /// state.
    fn emit_material(&self, batch: &RenderBatch, state: &mut PipelineState, output: &mut DisplayList) {
        let Some((key, material)) = batch
            .material
            .and_then(|key| self.scene.materials.get(key).map(|material| (key, material)))
        else {
            return;
        };

        if state.material.satisfies(&material.state) {
            log::trace!("Material {} already active", material.name);
            return;
        }

        output.push(Command::Comment(format!("Material {}", material.name)));

        match self.shared.name_of(key) {
            Some(list_name) => {
                let baseline = self.default_state.restricted_to(&material.state);
                let prefix = diff(&state.material, &baseline);
                state.apply_material(&baseline);
                output.extend(prefix);
                output.push(Command::CallList(list_name.to_string()));
            }
            None => output.extend(diff(&state.material, &material.state)),
        }

        state.apply_material(&material.state);
        output.push(Command::Comment(format!("End Material {}", material.name)));
    }
}
