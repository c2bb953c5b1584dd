//! Full compilation of a small skinned scene
//!
//! An arm with three bones and faces spanning every joint, drawn with a lit
//! material, next to an unskinned floor with an unlit one.

use crate::config::DisplayListSettings;
use crate::display_list::{Command, DisplayList};
use crate::foundation::collections::MeshId;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::{Face, SkinnedMesh, VertexType};
use crate::material::{Color, GeometryMode, Material, MaterialLibrary, MaterialState};
use crate::skeleton::BoneHierarchy;
use crate::{compile, compile_units, CompiledOutput, Diagnostic, Scene, UnitRequest};
use std::collections::BTreeMap;

fn lighting(enabled: bool) -> MaterialState {
    let mut state = MaterialState::default();
    state.geometry_modes.set(GeometryMode::LIGHTING, enabled);
    state
}

fn arm_scene() -> Scene {
    let mut hierarchy = BoneHierarchy::new();
    let upper = hierarchy.add_bone("upper", None, Transform::identity());
    let lower = hierarchy.add_bone("lower", Some(upper), Transform::from_position(Vec3::new(2.0, 0.0, 0.0)));
    let hand = hierarchy.add_bone("hand", Some(lower), Transform::from_position(Vec3::new(2.0, 0.0, 0.0)));

    let mut materials = MaterialLibrary::new();
    materials.insert(Material::new("default", lighting(false)));
    materials.insert(Material::new(
        "skin",
        MaterialState {
            env_color: Some(Color::new(230, 180, 150, 255)),
            ..lighting(true)
        },
    ));
    materials.insert(Material::new(
        "stone",
        MaterialState {
            env_color: Some(Color::new(90, 90, 90, 255)),
            ..lighting(false)
        },
    ));

    let positions = (0..6).map(|i| Vec3::new(i as f32, (i % 2) as f32, 0.0)).collect();
    let normals = vec![Vec3::z(); 6];
    let faces = vec![Face([0, 1, 2]), Face([1, 2, 3]), Face([2, 3, 4]), Face([3, 4, 5])];
    let arm = SkinnedMesh::new("arm", positions, faces, "skin")
        .with_normals(normals)
        .with_skin(
            &hierarchy,
            vec![Some(upper), Some(upper), Some(upper), Some(lower), Some(lower), Some(hand)],
            BTreeMap::new(),
        );

    let floor_positions = vec![
        Vec3::new(-4.0, 0.0, -4.0),
        Vec3::new(4.0, 0.0, -4.0),
        Vec3::new(4.0, 0.0, 4.0),
        Vec3::new(-4.0, 0.0, 4.0),
    ];
    let floor = SkinnedMesh::new("floor", floor_positions, vec![Face([0, 2, 1]), Face([0, 3, 2])], "stone");

    let mut scene = Scene::new(hierarchy, materials);
    scene.add_mesh(arm);
    scene.add_mesh(floor);
    scene
}

/// Commands with shared material lists inlined at their call sites
fn inlined(list: &DisplayList, output: &CompiledOutput) -> Vec<Command> {
    list.commands()
        .iter()
        .flat_map(|command| match command {
            Command::CallList(name) => output
                .shared_materials
                .iter()
                .find(|shared| shared.name() == name)
                .map(|shared| shared.commands().to_vec())
                .unwrap_or_default(),
            other => vec![other.clone()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_face_is_drawn() {
        let scene = arm_scene();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();

        assert_eq!(output.units.len(), 1);
        assert_eq!(output.units[0].display_list.triangle_count(), 6);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_matrix_stack_balanced_and_bounded() {
        let scene = arm_scene();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();

        let mut depth: i64 = 0;
        for command in output.units[0].display_list.commands() {
            match command {
                Command::PushMatrix { .. } => depth += 1,
                Command::PopMatrix { count } => depth -= *count as i64,
                _ => {}
            }
            assert!((0..=3).contains(&depth));
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_unit_ends_at_rest() {
        let scene = arm_scene();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();
        let commands = inlined(&output.units[0].display_list, &output);

        let default = scene.materials.state_of(scene.materials.key_of("default"));
        let mut state = default.clone();
        state.replay(&commands);

        assert!(state.satisfies(&default));
        assert_eq!(state.geometry_modes.get(GeometryMode::LIGHTING), Some(false));
    }

    #[test]
    fn test_loads_stay_inside_their_buffers() {
        let scene = arm_scene();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();
        let unit = &output.units[0];

        for command in unit.display_list.commands() {
            if let Command::LoadVertices {
                buffer,
                source_offset,
                count,
                first_slot,
            } = command
            {
                let vertices = unit.buffer(*buffer).unwrap().vertices.len() as u32;
                assert!(source_offset + count <= vertices);
                assert!(first_slot + count <= 32);
            }
        }
    }

    #[test]
    fn test_vertex_layout_follows_lighting() {
        let scene = arm_scene();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();
        let buffers = &output.units[0].vertex_buffers;

        let layout_of = |mesh: usize| {
            buffers
                .iter()
                .find(|buffer| buffer.mesh == Some(MeshId(mesh)))
                .map(|buffer| buffer.vertex_type)
        };

        assert_eq!(layout_of(0), Some(VertexType::Normal));
        assert_eq!(layout_of(1), Some(VertexType::Color));
        assert_eq!(buffers.len(), 2);
    }

    #[test]
    fn test_culling_prologue_comes_first() {
        let scene = arm_scene();
        let settings = DisplayListSettings::default().with_culling(true);
        let output = compile(&scene, &settings).unwrap();
        let unit = &output.units[0];
        let culling = unit.culling_buffer.as_ref().unwrap();

        assert_eq!(culling.vertices.len(), 8);
        assert_eq!(
            unit.display_list.commands()[1],
            Command::LoadVertices {
                buffer: culling.id,
                source_offset: 0,
                count: 8,
                first_slot: 0,
            }
        );
        assert_eq!(unit.display_list.commands()[2], Command::CullList { vertex_count: 8 });
    }

    #[test]
    fn test_units_share_material_lists() {
        let scene = arm_scene();
        let requests = [
            UnitRequest::new("arm_gfx", vec![MeshId(0)]),
            UnitRequest::new("floor_gfx", vec![MeshId(1)]),
        ];
        let output = compile_units(&scene, &requests, &DisplayListSettings::default()).unwrap();

        let names: Vec<&str> = output.shared_materials.iter().map(DisplayList::name).collect();
        assert_eq!(names, vec!["skin_material", "stone_material"]);

        assert_eq!(output.units[0].display_list.name(), "arm_gfx");
        assert!(output.units[0]
            .display_list
            .commands()
            .contains(&Command::CallList("skin_material".to_string())));
        assert!(output.units[1]
            .display_list
            .commands()
            .contains(&Command::CallList("stone_material".to_string())));

        let ids: Vec<_> = output
            .units
            .iter()
            .flat_map(|unit| unit.vertex_buffers.iter().map(|buffer| buffer.id))
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_unresolved_material_inherits_state() {
        let mut scene = arm_scene();
        let positions = vec![Vec3::zeros(), Vec3::x(), Vec3::y()];
        let ghost = scene.add_mesh(SkinnedMesh::new("ghost", positions, vec![Face([0, 1, 2])], "missing"));

        let output = compile(&scene, &DisplayListSettings::default()).unwrap();

        assert_eq!(output.units[0].display_list.triangle_count(), 7);
        assert_eq!(
            output.diagnostics.entries(),
            &[Diagnostic::UnresolvedMaterial {
                name: "missing".to_string(),
                mesh: ghost,
            }]
        );
    }

    #[test]
    fn test_bone_rest_poses_exported_in_vertex_units() {
        let scene = arm_scene();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();

        assert_eq!(output.bone_transforms.len(), 3);
        approx::assert_relative_eq!(output.bone_transforms[0].position, Vec3::zeros());
        approx::assert_relative_eq!(output.bone_transforms[1].position, Vec3::new(512.0, 0.0, 0.0));
        approx::assert_relative_eq!(output.bone_transforms[2].position, Vec3::new(512.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let scene = arm_scene();
        let settings = DisplayListSettings::default().with_vertex_cache_size(2);
        assert!(compile(&scene, &settings).is_err());
    }
}
