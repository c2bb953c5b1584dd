//! Render batch, the unit of scheduling

use crate::foundation::collections::{MaterialKey, MeshId};
use crate::skeleton::BonePair;

/// Faces of one mesh sharing one bone attachment and one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBatch {
    /// Bones the faces are attached to; equal for single-bone groups
    pub bone_pair: BonePair,
    /// Mesh the faces come from; `None` for the synthetic rest-state batch
    pub mesh: Option<MeshId>,
    /// Resolved material, `None` when resolution failed
    pub material: Option<MaterialKey>,
}

impl RenderBatch {
    /// Batch drawing the faces of `mesh` attached to `bone_pair`
    pub fn new(bone_pair: BonePair, mesh: MeshId, material: Option<MaterialKey>) -> Self {
        Self {
            bone_pair,
            mesh: Some(mesh),
            material,
        }
    }

    /// Synthetic batch representing the pipeline at rest
    pub fn sentinel(default_material: Option<MaterialKey>) -> Self {
        Self {
            bone_pair: (None, None),
            mesh: None,
            material: default_material,
        }
    }

    /// Whether this batch can anchor the ordering cycle
    pub fn is_rest_state(&self, default_material: Option<MaterialKey>) -> bool {
        self.bone_pair == (None, None) && self.material.is_some() && self.material == default_material
    }

    /// Whether the faces span two bones
    pub fn is_bone_spanning(&self) -> bool {
        self.bone_pair.0 != self.bone_pair.1
    }
}
