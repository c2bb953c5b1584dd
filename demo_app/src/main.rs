//! Display list compiler demo
//!
//! Builds a procedural three-bone arm and a random triangle soup, compiles
//! them and logs what was generated. An optional first argument names a
//! `.toml` or `.ron` settings file.

use std::collections::BTreeMap;

use rand::Rng;
use rcp_codegen::material::{Color, GeometryMode};
use rcp_codegen::prelude::*;

const SEGMENT_LENGTH: f32 = 1.5;
const RING_SIDES: u32 = 6;
const SOUP_TRIANGLES: usize = 60;

fn lit(enabled: bool) -> MaterialState {
    let mut state = MaterialState::default();
    state.geometry_modes.set(GeometryMode::LIGHTING, enabled);
    state
}

fn materials() -> MaterialLibrary {
    let mut library = MaterialLibrary::new();
    library.insert(Material::new("default", lit(true)));
    library.insert(Material::new(
        "skin",
        MaterialState {
            env_color: Some(Color::new(230, 180, 150, 255)),
            ..lit(true)
        },
    ));
    library.insert(Material::new(
        "confetti",
        MaterialState {
            env_color: Some(Color::new(255, 255, 255, 255)),
            ..lit(false)
        },
    ));
    library
}

/// Three bones along +X with a hexagonal tube skinned to them
fn build_arm(hierarchy: &mut BoneHierarchy) -> SkinnedMesh {
    let mut bones = Vec::new();
    let mut parent = None;
    for name in ["shoulder", "elbow", "wrist"] {
        let offset = if parent.is_some() { SEGMENT_LENGTH } else { 0.0 };
        let bone = hierarchy.add_bone(name, parent, Transform::from_position(Vec3::new(offset, 0.0, 0.0)));
        bones.push(bone);
        parent = Some(bone);
    }

    let rings = bones.len() as u32 + 1;
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut owners = Vec::new();

    for ring in 0..rings {
        let owner = bones[(ring as usize).min(bones.len() - 1)];
        for side in 0..RING_SIDES {
            let angle = side as f32 / RING_SIDES as f32 * std::f32::consts::TAU;
            let normal = Vec3::new(0.0, angle.cos(), angle.sin());
            positions.push(Vec3::new(ring as f32 * SEGMENT_LENGTH, 0.0, 0.0) + normal * 0.4);
            normals.push(normal);
            owners.push(Some(owner));
        }
    }

    let mut faces = Vec::new();
    for ring in 0..rings - 1 {
        for side in 0..RING_SIDES {
            let a = ring * RING_SIDES + side;
            let b = ring * RING_SIDES + (side + 1) % RING_SIDES;
            faces.push(Face([a, b, a + RING_SIDES]));
            faces.push(Face([b, b + RING_SIDES, a + RING_SIDES]));
        }
    }

    SkinnedMesh::new("arm", positions, faces, "skin")
        .with_normals(normals)
        .with_skin(hierarchy, owners, BTreeMap::new())
}

/// Unconnected triangles scattered around the origin
fn build_soup(rng: &mut impl Rng) -> SkinnedMesh {
    let mut positions = Vec::with_capacity(SOUP_TRIANGLES * 3);
    let mut colors = Vec::with_capacity(SOUP_TRIANGLES * 3);

    for _ in 0..SOUP_TRIANGLES * 3 {
        positions.push(Vec3::new(
            rng.gen_range(-5.0..5.0),
            rng.gen_range(0.0..3.0),
            rng.gen_range(-5.0..5.0),
        ));
        colors.push([rng.gen(), rng.gen(), rng.gen(), 1.0]);
    }

    let faces = (0..SOUP_TRIANGLES as u32)
        .map(|i| Face([i * 3, i * 3 + 1, i * 3 + 2]))
        .collect();

    SkinnedMesh::new("soup", positions, faces, "confetti").with_colors(colors)
}

fn load_settings() -> Result<DisplayListSettings, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading settings from {path}");
            Ok(DisplayListSettings::load_from_file(path)?)
        }
        None => Ok(DisplayListSettings::default().with_culling(true)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    rcp_codegen::foundation::logging::init();

    log::info!("Starting display list compiler demo");

    let settings = load_settings()?;
    let mut hierarchy = BoneHierarchy::new();
    let arm = build_arm(&mut hierarchy);
    let soup = build_soup(&mut rand::thread_rng());

    let mut scene = Scene::new(hierarchy, materials());
    let arm_id = scene.add_mesh(arm);
    let soup_id = scene.add_mesh(soup);

    let requests = [
        UnitRequest::new("arm_gfx", vec![arm_id]),
        UnitRequest::new("scene_gfx", vec![arm_id, soup_id]),
    ];
    let output = compile_units(&scene, &requests, &settings)?;

    for unit in &output.units {
        let list = &unit.display_list;
        log::info!(
            "{}: {} commands, {} triangles, {} loads, {} matrix operations",
            list.name(),
            list.len(),
            list.triangle_count(),
            list.count(|command| matches!(command, Command::LoadVertices { .. })),
            list.count(Command::is_matrix)
        );
    }

    for shared in &output.shared_materials {
        log::info!("Shared material {}: {} commands", shared.name(), shared.len());
    }

    output.diagnostics.report();
    if !output.failed_units.is_empty() {
        log::warn!("{} of {} units failed to compile", output.failed_units.len(), requests.len());
    }

    Ok(())
}
