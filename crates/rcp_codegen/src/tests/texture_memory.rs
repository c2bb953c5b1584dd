//! Texture memory tracking across material switches
//!
//! Two materials sample different textures from the same address through
//! different tiles, so switching back has to upload again.

use crate::batch::{prepare_meshes, RenderBatch};
use crate::config::DisplayListSettings;
use crate::display_list::Command;
use crate::emit::{BufferIds, MaterialCollector, UnitCompiler};
use crate::foundation::collections::{MaterialKey, MeshId};
use crate::foundation::math::Vec3;
use crate::geometry::{Face, SkinnedMesh};
use crate::material::{ImageFormat, ImageSize, Material, MaterialLibrary, MaterialState, TextureInfo, TileState};
use crate::skeleton::BoneHierarchy;
use crate::{Diagnostics, Scene};

fn textured(name: &str, tile: usize) -> MaterialState {
    let mut state = MaterialState::default();
    let texture = TextureInfo::new(name, 32, 32, ImageFormat::Rgba, ImageSize::Bits16);
    state.tiles[tile] = Some(TileState::for_texture(texture, 0));
    state
}

fn shared_address_scene() -> (Scene, MaterialKey, MaterialKey) {
    let mut materials = MaterialLibrary::new();
    materials.insert(Material::new("default", MaterialState::default()));
    let stone = materials.insert(Material::new("stone", textured("stone", 0)));
    let brick = materials.insert(Material::new("brick", textured("brick", 1)));

    let mut scene = Scene::new(BoneHierarchy::new(), materials);
    let positions = vec![Vec3::zeros(), Vec3::x(), Vec3::y()];
    scene.add_mesh(SkinnedMesh::new("wall", positions, vec![Face([0, 1, 2])], "stone"));

    (scene, stone, brick)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switching_back_reuploads_overwritten_texture() {
        let (scene, stone, brick) = shared_address_scene();
        let settings = DisplayListSettings::default();
        let default_state = scene.materials.state_of(scene.materials.key_of("default"));
        let meshes = prepare_meshes(&scene, &settings);
        let shared = MaterialCollector::new().build_shared(&scene.materials, &default_state);

        let compiler = UnitCompiler {
            scene: &scene,
            meshes: &meshes,
            settings: &settings,
            default_state: &default_state,
            shared: &shared,
        };

        let order = [stone, brick, stone];
        let batches: Vec<RenderBatch> = order
            .iter()
            .map(|&material| RenderBatch::new((None, None), MeshId(0), Some(material)))
            .collect();

        let mut diagnostics = Diagnostics::new();
        let unit = compiler
            .compile("wall_gfx", &batches, &mut BufferIds::default(), &mut diagnostics)
            .unwrap();
        let commands = unit.display_list.commands();

        let draws: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, command)| matches!(command, Command::Triangle1(_) | Command::Triangle2(..)))
            .map(|(position, _)| position)
            .collect();
        assert_eq!(draws.len(), 3);

        for (&position, &material) in draws.iter().zip(&order) {
            let mut hardware = default_state.clone();
            hardware.replay(&commands[..position]);
            assert!(hardware.satisfies(&scene.materials.state_of(Some(material))));
        }

        let uploads = unit.display_list.count(|command| {
            matches!(command, Command::Raw(crate::display_list::StateCommand::LoadBlock { .. }))
        });
        assert_eq!(uploads, 3);
    }
}
