//! Error and diagnostic types
//!
//! Structural failures that make the rest of a unit meaningless are returned as
//! [`CodegenError`]. Problems confined to a single value or batch are collected
//! as [`Diagnostic`]s and handed back alongside the generated output.

use crate::config::ConfigError;
use crate::foundation::collections::{MeshId, VertexBufferId};

/// Result type for code generation operations
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors that abort compilation of the current unit
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Reaching a bone would push more matrices than the hardware stack holds
    #[error("Matrix stack overflow: reaching {} needs depth {required} > {max_depth} (chain: {})", .chain.last().map_or("<root>", String::as_str), .chain.join(" -> "))]
    MatrixStackOverflow {
        /// Bone names from the root to the requested bone
        chain: Vec<String>,
        /// Depth the traversal would have required
        required: usize,
        /// Configured stack limit
        max_depth: usize,
    },

    /// More distinct vertices were requested than the cache can hold
    #[error("Vertex cache overflow: {requested} vertices requested, capacity {capacity}")]
    CacheOverflow {
        /// Number of vertices requested at once
        requested: usize,
        /// Slots available
        capacity: usize,
    },

    /// A batch references a mesh that is not part of the scene
    #[error("Unknown mesh: {0:?}")]
    UnknownMesh(MeshId),

    /// The settings failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Semantic role of a converted vertex value, reported with range failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRole {
    /// Position x
    PositionX,
    /// Position y
    PositionY,
    /// Position z
    PositionZ,
    /// Texture s coordinate
    TextureU,
    /// Texture t coordinate
    TextureV,
}

impl std::fmt::Display for ValueRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueRole::PositionX => "x coordinate",
            ValueRole::PositionY => "y coordinate",
            ValueRole::PositionZ => "z coordinate",
            ValueRole::TextureU => "texture u coordinate",
            ValueRole::TextureV => "texture v coordinate",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem found while generating a unit
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    /// A value does not fit the hardware's fixed-point representation and was clamped
    #[error("The value {value} is too big to fit into a short for {role} (vertex {vertex} of {buffer})")]
    ValueOutOfRange {
        /// Buffer being generated
        buffer: VertexBufferId,
        /// Vertex index inside the buffer
        vertex: usize,
        /// What the value represents
        role: ValueRole,
        /// Rounded value before clamping
        value: i64,
    },

    /// A mesh's material is not in the library; its batches inherit the preceding state
    #[error("Material `{name}` used by mesh {mesh:?} could not be resolved")]
    UnresolvedMaterial {
        /// Requested material name
        name: String,
        /// Mesh that requested it
        mesh: MeshId,
    },
}

/// Ordered collection of diagnostics for one compilation
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// All recorded diagnostics in the order they were found
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Log every diagnostic at warning level
    pub fn report(&self) {
        for diagnostic in &self.entries {
            log::warn!("{diagnostic}");
        }
    }
}
