//! Handle types and the keyed storage used for scene resources

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a material stored in a [`crate::material::MaterialLibrary`]
    pub struct MaterialKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;

/// Index of a mesh inside a [`crate::scene::Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct MeshId(pub usize);

/// Identifier of a vertex buffer produced for a unit
///
/// Two batches drawing the same mesh with the same vertex layout share one buffer,
/// which is what lets the vertex cache recognise resident vertices across batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct VertexBufferId(pub u32);

impl std::fmt::Display for VertexBufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vtx#{}", self.0)
    }
}
