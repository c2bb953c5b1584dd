//! # RCP Codegen
//!
//! An offline compiler that turns skinned, material-tagged meshes into display
//! lists for a fixed-function coprocessor with a small vertex cache, a
//! hardware matrix stack and expensive register changes.
//!
//! ## Pipeline
//!
//! - **Batching**: meshes are cut into render batches along bone boundaries
//! - **Ordering**: batches are reordered to minimise material and matrix changes
//! - **Simulation**: the coprocessor's cache, stack and registers are tracked
//!   so only commands that change something are emitted
//! - **Materials**: register snapshots are diffed into minimal command sequences
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rcp_codegen::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut materials = MaterialLibrary::new();
//!     materials.insert(Material::new("default", MaterialState::default()));
//!
//!     let mut scene = Scene::new(BoneHierarchy::new(), materials);
//!     scene.add_mesh(SkinnedMesh::new(
//!         "triangle",
//!         vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
//!         vec![Face([0, 1, 2])],
//!         "default",
//!     ));
//!
//!     let output = compile(&scene, &DisplayListSettings::default())?;
//!     println!("{} commands", output.units[0].display_list.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;

pub mod batch;
pub mod config;
pub mod display_list;
pub mod emit;
pub mod error;
pub mod geometry;
pub mod material;
pub mod pipeline;
pub mod skeleton;

mod scene;

pub use emit::{compile, compile_units, CompiledOutput, CompiledUnit, UnitFailure, UnitRequest};
pub use error::{CodegenError, CodegenResult, Diagnostic, Diagnostics};
pub use scene::Scene;

#[cfg(test)]
mod tests;

/// Common imports for compiler users
pub mod prelude {
    pub use crate::{
        compile, compile_units,
        config::{Config, DisplayListSettings},
        display_list::{Command, DisplayList, StateCommand},
        foundation::{
            collections::{MaterialKey, MeshId, VertexBufferId},
            math::{Mat4, Transform, Vec2, Vec3},
        },
        geometry::{Face, SkinnedMesh, VertexBuffer, VertexType},
        material::{Material, MaterialLibrary, MaterialState, TransitionTiming},
        skeleton::{BoneHierarchy, BoneId},
        CodegenError, CompiledOutput, CompiledUnit, Diagnostic, Diagnostics, Scene, UnitFailure, UnitRequest,
    };
}
