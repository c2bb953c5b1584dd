//! Matrix stack behaviour across consecutive batches

use crate::config::DisplayListSettings;
use crate::display_list::Command;
use crate::foundation::collections::MeshId;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::{Face, SkinnedMesh};
use crate::material::{Material, MaterialLibrary, MaterialState};
use crate::skeleton::{BoneHierarchy, BoneId};
use crate::{compile, compile_units, CodegenError, Scene, UnitRequest};
use std::collections::BTreeMap;

/// shoulder -> arm, with two meshes skinned entirely to the arm
fn two_meshes_on_one_bone() -> (Scene, BoneId) {
    let mut hierarchy = BoneHierarchy::new();
    let shoulder = hierarchy.add_bone("shoulder", None, Transform::identity());
    let arm = hierarchy.add_bone("arm", Some(shoulder), Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));

    let mut materials = MaterialLibrary::new();
    materials.insert(Material::new("default", MaterialState::default()));

    let mut scene = Scene::new(hierarchy, materials);
    for name in ["sleeve", "cuff"] {
        let positions = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let mesh = SkinnedMesh::new(name, positions, vec![Face([0, 1, 2])], "default").with_skin(
            &scene.hierarchy,
            vec![Some(arm); 3],
            BTreeMap::new(),
        );
        scene.add_mesh(mesh);
    }

    (scene, arm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_batches_reuse_matrix() {
        let (scene, arm) = two_meshes_on_one_bone();
        let output = compile(&scene, &DisplayListSettings::default()).unwrap();
        let commands = output.units[0].display_list.commands();

        let pushes: Vec<BoneId> = commands
            .iter()
            .filter_map(|command| match command {
                Command::PushMatrix { bone } => Some(*bone),
                _ => None,
            })
            .collect();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes.last(), Some(&arm));

        let first_draw = commands.iter().position(|command| command.triangle_count() > 0).unwrap();
        let last_draw = commands.iter().rposition(|command| command.triangle_count() > 0).unwrap();
        assert!(first_draw < last_draw);
        assert!(!commands[first_draw..last_draw].iter().any(Command::is_matrix));

        assert_eq!(commands.last(), Some(&Command::PopMatrix { count: 2 }));
    }

    #[test]
    fn test_single_pops_without_multi_pop() {
        let (scene, _) = two_meshes_on_one_bone();
        let settings = DisplayListSettings::default().with_multi_pop(false);
        let output = compile(&scene, &settings).unwrap();

        let pops = output.units[0]
            .display_list
            .count(|command| *command == Command::PopMatrix { count: 1 });
        assert_eq!(pops, 2);
    }

    #[test]
    fn test_overflow_aborts_the_unit() {
        let (scene, _) = two_meshes_on_one_bone();
        let settings = DisplayListSettings::default().with_max_matrix_depth(1);
        let output = compile(&scene, &settings).unwrap();

        assert!(output.units.is_empty());
        assert_eq!(output.failed_units.len(), 1);
        match &output.failed_units[0].error {
            CodegenError::MatrixStackOverflow { chain, max_depth, .. } => {
                assert_eq!(chain, &vec!["shoulder", "arm"]);
                assert_eq!(*max_depth, 1);
            }
            other => panic!("expected a matrix stack overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_overflow_leaves_other_units_intact() {
        let (mut scene, _) = two_meshes_on_one_bone();
        let positions = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
        let prop = scene.add_mesh(SkinnedMesh::new("prop", positions, vec![Face([0, 1, 2])], "default"));

        let requests = [
            UnitRequest::new("sleeve_gfx", vec![MeshId(0)]),
            UnitRequest::new("prop_gfx", vec![prop]),
        ];
        let settings = DisplayListSettings::default().with_max_matrix_depth(1);
        let output = compile_units(&scene, &requests, &settings).unwrap();

        assert_eq!(output.failed_units.len(), 1);
        assert_eq!(output.failed_units[0].name, "sleeve_gfx");
        assert!(output.unit("sleeve_gfx").is_none());

        let survivor = output.unit("prop_gfx").unwrap();
        assert_eq!(survivor.display_list.triangle_count(), 1);
        assert_eq!(survivor.vertex_buffers.len(), 1);
    }
}
