//! Bounding-box culling prologue

use crate::display_list::{Command, DisplayList};
use crate::error::Diagnostics;
use crate::foundation::collections::VertexBufferId;
use crate::foundation::math::{utils, Vec3};
use crate::geometry::{Face, SkinnedMesh, VertexBuffer, VertexBufferBuilder, VertexType};
use crate::material::{GeometryMode, MaterialState};
use crate::pipeline::PipelineState;

/// Corners of an axis-aligned box
pub const CULL_VERTEX_COUNT: u32 = 8;

/// Union of the bounds of `meshes`
pub fn combined_bounds<'a>(meshes: impl IntoIterator<Item = &'a SkinnedMesh>) -> Option<(Vec3, Vec3)> {
    meshes
        .into_iter()
        .filter_map(SkinnedMesh::bounding_box)
        .reduce(|(min_a, max_a), (min_b, max_b)| {
            (utils::component_min(&min_a, &min_b), utils::component_max(&max_a, &max_b))
        })
}

/// Vertex buffer holding the eight corners of `bounds`
pub fn culling_buffer(
    id: VertexBufferId,
    name: &str,
    bounds: (Vec3, Vec3),
    builder: &VertexBufferBuilder<'_>,
    diagnostics: &mut Diagnostics,
) -> VertexBuffer {
    let (min, max) = bounds;
    let corners = (0..CULL_VERTEX_COUNT)
        .map(|corner| {
            Vec3::new(
                if corner & 4 == 0 { min.x } else { max.x },
                if corner & 2 == 0 { min.y } else { max.y },
                if corner & 1 == 0 { min.z } else { max.z },
            )
        })
        .collect();

    let mesh = SkinnedMesh::new(format!("{name}_cull"), corners, Vec::<Face>::new(), "");
    builder.build(id, None, &mesh, VertexType::Normal, None, diagnostics)
}

/// Load the box into the first slots and end the list if it is off screen
///
/// Lighting is off while the corners load so they are not lit, and comes back
/// on afterwards when the rest state has it on.
pub fn emit_culling_prologue(
    state: &mut PipelineState,
    default: &MaterialState,
    buffer: VertexBufferId,
    output: &mut DisplayList,
) {
    output.push(Command::SetGeometryMode {
        clear: GeometryMode::LIGHTING,
        set: GeometryMode::empty(),
    });
    state.material.geometry_modes.set(GeometryMode::LIGHTING, false);

    output.push(Command::LoadVertices {
        buffer,
        source_offset: 0,
        count: CULL_VERTEX_COUNT,
        first_slot: 0,
    });
    output.push(Command::CullList {
        vertex_count: CULL_VERTEX_COUNT,
    });

    if default.geometry_modes.get(GeometryMode::LIGHTING) == Some(true) {
        output.push(Command::SetGeometryMode {
            clear: GeometryMode::empty(),
            set: GeometryMode::LIGHTING,
        });
        state.material.geometry_modes.set(GeometryMode::LIGHTING, true);
    }

    state.vertex_cache.invalidate(0..CULL_VERTEX_COUNT as usize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayListSettings;

    #[test]
    fn test_bounds_cover_every_mesh() {
        let a = SkinnedMesh::new("a", vec![Vec3::new(-1.0, 0.0, 2.0)], Vec::new(), "m");
        let b = SkinnedMesh::new("b", vec![Vec3::new(3.0, -4.0, 0.0), Vec3::new(0.0, 5.0, 0.0)], Vec::new(), "m");

        let (min, max) = combined_bounds([&a, &b]).unwrap();

        assert_eq!(min, Vec3::new(-1.0, -4.0, 0.0));
        assert_eq!(max, Vec3::new(3.0, 5.0, 2.0));
        assert!(combined_bounds(std::iter::empty()).is_none());
    }

    #[test]
    fn test_culling_buffer_has_corners() {
        let settings = DisplayListSettings::default();
        let mut diagnostics = Diagnostics::new();
        let buffer = culling_buffer(
            VertexBufferId(7),
            "model",
            (Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 2.0, 3.0)),
            &VertexBufferBuilder::new(&settings),
            &mut diagnostics,
        );

        assert_eq!(buffer.vertices.len(), 8);
        assert_eq!(buffer.vertices[0].position, [-256, -256, -256]);
        assert_eq!(buffer.vertices[7].position, [256, 512, 768]);
        assert_eq!(buffer.mesh, None);
    }

    #[test]
    fn test_prologue_restores_lighting() {
        let settings = DisplayListSettings::default();
        let mut default = MaterialState::default();
        default.geometry_modes.set(GeometryMode::LIGHTING, true);
        let mut state = PipelineState::new(&settings, default.clone());
        let mut list = DisplayList::new("model");

        emit_culling_prologue(&mut state, &default, VertexBufferId(0), &mut list);

        assert_eq!(list.len(), 4);
        assert_eq!(list.commands()[2], Command::CullList { vertex_count: 8 });
        assert_eq!(state.material.geometry_modes.get(GeometryMode::LIGHTING), Some(true));
        assert!(state.vertex_cache.slot(0).is_none());
    }

    #[test]
    fn test_prologue_leaves_lighting_off_when_unlit() {
        let settings = DisplayListSettings::default();
        let default = MaterialState::default();
        let mut state = PipelineState::new(&settings, default.clone());
        let mut list = DisplayList::new("model");

        emit_culling_prologue(&mut state, &default, VertexBufferId(0), &mut list);

        assert_eq!(list.len(), 3);
        assert_eq!(state.material.geometry_modes.get(GeometryMode::LIGHTING), Some(false));
    }
}
