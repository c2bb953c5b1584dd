//! Input scene
//!
//! Everything the importer produced for one model: the bone tree, the meshes
//! attached to it and the materials they reference.

use crate::error::{CodegenError, CodegenResult};
use crate::foundation::collections::MeshId;
use crate::geometry::SkinnedMesh;
use crate::material::MaterialLibrary;
use crate::skeleton::BoneHierarchy;

/// A fully imported model
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Bone tree
    pub hierarchy: BoneHierarchy,
    /// Available materials
    pub materials: MaterialLibrary,
    meshes: Vec<SkinnedMesh>,
}

impl Scene {
    /// Create a scene without meshes
    pub fn new(hierarchy: BoneHierarchy, materials: MaterialLibrary) -> Self {
        Self {
            hierarchy,
            materials,
            meshes: Vec::new(),
        }
    }

    /// Add a mesh
    pub fn add_mesh(&mut self, mesh: SkinnedMesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Mesh by id
    pub fn mesh(&self, id: MeshId) -> CodegenResult<&SkinnedMesh> {
        self.meshes.get(id.0).ok_or(CodegenError::UnknownMesh(id))
    }

    /// Ids of every mesh in insertion order
    pub fn mesh_ids(&self) -> impl Iterator<Item = MeshId> {
        (0..self.meshes.len()).map(MeshId)
    }

    /// Every mesh with its id
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &SkinnedMesh)> {
        self.meshes.iter().enumerate().map(|(index, mesh)| (MeshId(index), mesh))
    }

    /// Number of meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}
