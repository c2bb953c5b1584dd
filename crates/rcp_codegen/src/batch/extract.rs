//! Render batch extraction
//!
//! Splits every mesh along its precomputed face groups and resolves the
//! material each group is drawn with.

use std::borrow::Cow;

use super::render_batch::RenderBatch;
use crate::config::DisplayListSettings;
use crate::error::{CodegenResult, Diagnostic, Diagnostics};
use crate::foundation::collections::MeshId;
use crate::geometry::{cube_project_uvs, SkinnedMesh};
use crate::scene::Scene;

/// Meshes ready for vertex conversion, with automatic UVs applied
///
/// Meshes whose material carries a tile size get planar texture coordinates;
/// every other mesh is borrowed unchanged.
pub fn prepare_meshes<'a>(scene: &'a Scene, settings: &DisplayListSettings) -> Vec<Cow<'a, SkinnedMesh>> {
    let force = settings.force_material.as_deref();

    scene
        .meshes()
        .map(|(_, mesh)| {
            let tile_size = scene
                .materials
                .resolve(&mesh.material_name, force)
                .and_then(|key| scene.materials.get(key))
                .and_then(|material| material.tile_size());

            match tile_size {
                Some((s, t)) => {
                    log::debug!("Projecting texture coordinates for {} ({s} x {t})", mesh.name);
                    let mut projected = mesh.clone();
                    cube_project_uvs(&mut projected, settings.model_scale / s, settings.model_scale / t);
                    Cow::Owned(projected)
                }
                None => Cow::Borrowed(mesh),
            }
        })
        .collect()
}

/// One batch per face group of every listed mesh
///
/// A mesh whose material cannot be resolved still produces batches, with no
/// material, and the problem is recorded in `diagnostics`.
pub fn extract_batches(
    scene: &Scene,
    meshes: &[MeshId],
    settings: &DisplayListSettings,
    diagnostics: &mut Diagnostics,
) -> CodegenResult<Vec<RenderBatch>> {
    let force = settings.force_material.as_deref();
    let mut batches = Vec::new();

    for &id in meshes {
        let mesh = scene.mesh(id)?;
        let material = scene.materials.resolve(&mesh.material_name, force);

        if material.is_none() {
            let name = force.unwrap_or(&mesh.material_name).to_string();
            log::warn!("Could not resolve material {name} for mesh {}", mesh.name);
            diagnostics.push(Diagnostic::UnresolvedMaterial { name, mesh: id });
        }

        for (&bone, faces) in mesh.faces_for_bone() {
            if !faces.is_empty() {
                batches.push(RenderBatch::new((bone, bone), id, material));
            }
        }

        for (&pair, faces) in mesh.bone_spanning_faces() {
            if !faces.is_empty() {
                batches.push(RenderBatch::new(pair, id, material));
            }
        }
    }

    log::debug!("Extracted {} render batches from {} meshes", batches.len(), meshes.len());

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::geometry::Face;
    use crate::material::{Material, MaterialLibrary, MaterialState, TILE_SIZE_S_PROPERTY};
    use crate::skeleton::BoneHierarchy;
    use std::collections::BTreeMap;

    fn scene() -> Scene {
        let mut hierarchy = BoneHierarchy::new();
        let upper = hierarchy.add_bone("upper", None, Transform::identity());
        let lower = hierarchy.add_bone("lower", Some(upper), Transform::identity());

        let mut materials = MaterialLibrary::new();
        materials.insert(Material::new("skin", MaterialState::default()));
        materials.insert(Material::new("floor", MaterialState::default()).with_property(TILE_SIZE_S_PROPERTY, "2"));

        let positions = (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let arm = SkinnedMesh::new("arm", positions, vec![Face([0, 1, 2]), Face([1, 2, 3])], "skin").with_skin(
            &hierarchy,
            vec![Some(upper), Some(upper), Some(upper), Some(lower)],
            BTreeMap::new(),
        );

        let floor_positions = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0)];
        let floor = SkinnedMesh::new("floor", floor_positions, vec![Face([0, 2, 1])], "floor");

        let mut scene = Scene::new(hierarchy, materials);
        scene.add_mesh(arm);
        scene.add_mesh(floor);
        scene
    }

    #[test]
    fn test_batch_per_face_group() {
        let scene = scene();
        let settings = DisplayListSettings::default();
        let mut diagnostics = Diagnostics::new();
        let ids: Vec<MeshId> = scene.mesh_ids().collect();

        let batches = extract_batches(&scene, &ids, &settings, &mut diagnostics).unwrap();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches.iter().filter(|batch| batch.is_bone_spanning()).count(), 1);
        assert!(batches.iter().all(|batch| batch.material.is_some()));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_material_is_reported() {
        let scene = scene();
        let settings = DisplayListSettings::default().with_force_material("missing");
        let mut diagnostics = Diagnostics::new();

        let batches = extract_batches(&scene, &[MeshId(1)], &settings, &mut diagnostics).unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].material, None);
        assert_eq!(
            diagnostics.entries(),
            &[Diagnostic::UnresolvedMaterial {
                name: "missing".to_string(),
                mesh: MeshId(1),
            }]
        );
    }

    #[test]
    fn test_unknown_mesh_is_an_error() {
        let scene = scene();
        let mut diagnostics = Diagnostics::new();
        let result = extract_batches(&scene, &[MeshId(9)], &DisplayListSettings::default(), &mut diagnostics);
        assert!(result.is_err());
    }

    #[test]
    fn test_tiled_material_gets_projected_uvs() {
        let scene = scene();
        let prepared = prepare_meshes(&scene, &DisplayListSettings::default());

        assert!(matches!(prepared[0], Cow::Borrowed(_)));
        let uvs = prepared[1].uvs.as_ref().unwrap();
        assert_eq!(uvs[1].x, 2.0);
        assert_eq!(uvs[2].y, 2.0);
    }
}
