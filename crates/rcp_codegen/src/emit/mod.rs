//! Command emission
//!
//! Ties the stages together: extract batches per unit, order them, collect
//! shared materials across units and compile each unit against a simulated
//! pipeline.

pub mod culling;
mod geometry;
mod materials;
mod unit;

pub use geometry::GeometryEmitter;
pub use materials::{c_identifier, MaterialCollector, SharedMaterials};
pub use unit::{BufferIds, CompiledUnit, UnitCompiler};

use serde::Serialize;

use crate::batch::{extract_batches, order_batches, prepare_meshes, RenderBatch};
use crate::config::DisplayListSettings;
use crate::display_list::DisplayList;
use crate::error::{CodegenError, CodegenResult, Diagnostics};
use crate::foundation::collections::MeshId;
use crate::foundation::math::Transform;
use crate::scene::Scene;

/// Name of the unit produced by [`compile`]
pub const DEFAULT_UNIT_NAME: &str = "model_gfx";

/// Meshes to draw together in one display list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRequest {
    /// Symbol name of the generated list
    pub name: String,
    /// Meshes drawn by the list
    pub meshes: Vec<MeshId>,
}

impl UnitRequest {
    /// Request a unit
    pub fn new(name: impl Into<String>, meshes: Vec<MeshId>) -> Self {
        Self {
            name: name.into(),
            meshes,
        }
    }
}

/// A unit whose compilation was aborted
#[derive(Debug)]
pub struct UnitFailure {
    /// Name of the requested unit
    pub name: String,
    /// Why it was abandoned
    pub error: CodegenError,
}

/// Everything generated for one export
#[derive(Debug, Serialize)]
pub struct CompiledOutput {
    /// Successfully compiled units, in request order
    pub units: Vec<CompiledUnit>,
    /// Standalone lists called by the units
    pub shared_materials: Vec<DisplayList>,
    /// Bone rest poses in vertex units, indexed by bone id
    pub bone_transforms: Vec<Transform>,
    /// Units that hit a fatal error; the others are unaffected
    #[serde(skip)]
    pub failed_units: Vec<UnitFailure>,
    /// Non-fatal problems found along the way
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl CompiledOutput {
    /// Compiled unit by request name
    pub fn unit(&self, name: &str) -> Option<&CompiledUnit> {
        self.units.iter().find(|unit| unit.display_list.name() == name)
    }
}

fn abandon(request: &UnitRequest, error: CodegenError, failed_units: &mut Vec<UnitFailure>) {
    log::error!("Unit {} aborted: {}", request.name, error);
    failed_units.push(UnitFailure {
        name: request.name.clone(),
        error,
    });
}

/// Compile every mesh of the scene into a single display list
pub fn compile(scene: &Scene, settings: &DisplayListSettings) -> CodegenResult<CompiledOutput> {
    let request = UnitRequest::new(DEFAULT_UNIT_NAME, scene.mesh_ids().collect());
    compile_units(scene, std::slice::from_ref(&request), settings)
}

/// Compile several display lists that share material lists
///
/// Only invalid settings fail the whole export. A unit that cannot be
/// compiled is reported in [`CompiledOutput::failed_units`].
pub fn compile_units(
    scene: &Scene,
    requests: &[UnitRequest],
    settings: &DisplayListSettings,
) -> CodegenResult<CompiledOutput> {
    settings.validate()?;

    let mut diagnostics = Diagnostics::new();
    let default_key = scene.materials.key_of(&settings.default_material);
    if default_key.is_none() {
        log::warn!(
            "Default material {} not found, assuming nothing about the pipeline at rest",
            settings.default_material
        );
    }
    let default_state = scene.materials.state_of(default_key);

    let meshes = prepare_meshes(scene, settings);

    let mut collector = MaterialCollector::new();
    let mut failed_units = Vec::new();
    let mut ordered_units: Vec<(&UnitRequest, Vec<RenderBatch>)> = Vec::with_capacity(requests.len());

    for request in requests {
        let batches = match extract_batches(scene, &request.meshes, settings, &mut diagnostics) {
            Ok(batches) => batches,
            Err(error) => {
                abandon(request, error, &mut failed_units);
                continue;
            }
        };
        let ordered = order_batches(
            scene,
            batches,
            default_key,
            &settings.timing,
            settings.max_optimization_iterations,
        );
        collector.collect_unit(&ordered);
        ordered_units.push((request, ordered));
    }

    let shared = collector.build_shared(&scene.materials, &default_state);
    let compiler = UnitCompiler {
        scene,
        meshes: &meshes,
        settings,
        default_state: &default_state,
        shared: &shared,
    };

    let mut ids = BufferIds::default();
    let mut units = Vec::with_capacity(requests.len());
    for (request, batches) in &ordered_units {
        match compiler.compile(&request.name, batches, &mut ids, &mut diagnostics) {
            Ok(unit) => units.push(unit),
            Err(error) => abandon(request, error, &mut failed_units),
        }
    }

    if !diagnostics.is_empty() {
        log::info!("Compilation finished with {} diagnostics", diagnostics.len());
    }

    Ok(CompiledOutput {
        units,
        shared_materials: shared.into_lists(),
        bone_transforms: scene
            .hierarchy
            .rest_transforms(settings.fixed_point_scale * settings.model_scale, &settings.model_rotation()),
        failed_units,
        diagnostics,
    })
}
