//! Simulation of the coprocessor's vertex cache, matrix stack and registers
//!
//! The emitter consults this state to decide which commands are actually
//! needed and updates it after every command it writes.

mod matrix_stack;
mod state;
mod vertex_cache;

pub use matrix_stack::{traversal_counts, MatrixStack};
pub use state::PipelineState;
pub use vertex_cache::{VertexCache, VertexKey};

/// Largest vertex cache any supported microcode exposes
pub const MAX_VERTEX_CACHE_SIZE: usize = 32;
