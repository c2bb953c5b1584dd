//! Mesh data consumed by the compiler
//!
//! - [`SkinnedMesh`]: geometry with bone ownership and face groups
//! - [`uv_projection`]: planar texture coordinates for tiled materials
//! - [`vertex_buffer`]: conversion into the fixed-point vertex format

mod mesh;
pub mod uv_projection;
pub mod vertex_buffer;

pub use mesh::{Face, SkinnedMesh};
pub use uv_projection::cube_project_uvs;
pub use vertex_buffer::{HardwareVertex, ShadingAttribute, VertexBuffer, VertexBufferBuilder, VertexType};
