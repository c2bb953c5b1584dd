//! Fixed-point vertex buffers
//!
//! Converts mesh vertices into the hardware's 16-bit vertex format. Values
//! that do not fit are clamped and reported; conversion always finishes.

use serde::Serialize;

use super::mesh::SkinnedMesh;
use crate::config::DisplayListSettings;
use crate::error::{Diagnostic, Diagnostics, ValueRole};
use crate::foundation::collections::{MeshId, VertexBufferId};
use crate::foundation::math::{Mat3, Mat4, Point3, Vec3};

/// Texture coordinates are stored in 10.5 fixed point
const UV_FRACTION_SCALE: f32 = 32.0;

/// Meaning of the third vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VertexType {
    /// Position, texture coordinate and normal; used by lit materials
    Normal,
    /// Position, texture coordinate and color
    Color,
}

/// Per-vertex shading attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShadingAttribute {
    /// Signed normal and alpha
    Normal {
        /// Normal scaled to the signed byte range
        normal: [i8; 3],
        /// Alpha
        alpha: u8,
    },
    /// RGBA color
    Color([u8; 4]),
}

/// One vertex as the hardware reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HardwareVertex {
    /// Position in fixed-point model units
    pub position: [i16; 3],
    /// Texture coordinate in 10.5 fixed point texels
    pub uv: [i16; 2],
    /// Normal or color
    pub shading: ShadingAttribute,
}

/// Vertex data for one mesh in one layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexBuffer {
    /// Identifier referenced by load commands
    pub id: VertexBufferId,
    /// Symbol name
    pub name: String,
    /// Mesh the data comes from; `None` for generated bounding volumes
    pub mesh: Option<MeshId>,
    /// Layout
    pub vertex_type: VertexType,
    /// Converted vertices, parallel to the mesh's vertices
    pub vertices: Vec<HardwareVertex>,
}

/// Convert one vertex buffer
pub struct VertexBufferBuilder<'a> {
    settings: &'a DisplayListSettings,
    global: Mat4,
}

impl<'a> VertexBufferBuilder<'a> {
    /// Create a builder for the given export settings
    pub fn new(settings: &'a DisplayListSettings) -> Self {
        Self {
            settings,
            global: settings.global_transform(),
        }
    }

    /// Convert `mesh` into hardware vertices
    ///
    /// `texture_size` is the size of the first textured tile of the material,
    /// used to scale texture coordinates into texels.
    pub fn build(
        &self,
        id: VertexBufferId,
        mesh_id: Option<MeshId>,
        mesh: &SkinnedMesh,
        vertex_type: VertexType,
        texture_size: Option<(u32, u32)>,
        diagnostics: &mut Diagnostics,
    ) -> VertexBuffer {
        let scale = self.settings.fixed_point_scale * self.settings.model_scale;
        let mut vertices = Vec::with_capacity(mesh.vertex_count());

        for (index, position) in mesh.positions.iter().enumerate() {
            let offset = mesh
                .vertex_bone(index as u32)
                .and_then(|bone| mesh.bone_offset(bone))
                .map(|offset| Mat4::new_scaling(scale) * offset);
            let transform = offset.as_ref().unwrap_or(&self.global);

            let mut convert = |value: f32, role: ValueRole| {
                to_fixed(value).unwrap_or_else(|raw| {
                    diagnostics.push(Diagnostic::ValueOutOfRange {
                        buffer: id,
                        vertex: index,
                        role,
                        value: raw,
                    });
                    clamp_i16(raw)
                })
            };

            let moved = transform.transform_point(&Point3::from(*position));
            let position = [
                convert(moved.x, ValueRole::PositionX),
                convert(moved.y, ValueRole::PositionY),
                convert(moved.z, ValueRole::PositionZ),
            ];

            let uv = match (mesh.uvs.as_ref(), texture_size) {
                (Some(uvs), Some((width, height))) => {
                    let uv = uvs[index];
                    [
                        convert(uv.x * width as f32 * UV_FRACTION_SCALE, ValueRole::TextureU),
                        convert((1.0 - uv.y) * height as f32 * UV_FRACTION_SCALE, ValueRole::TextureV),
                    ]
                }
                _ => [0, 0],
            };

            let shading = match vertex_type {
                VertexType::Normal => {
                    let rotation: Mat3 = transform.fixed_view::<3, 3>(0, 0).into_owned();
                    let normal = mesh
                        .normals
                        .as_ref()
                        .map_or_else(Vec3::zeros, |normals| normals[index]);
                    let normal = (rotation * normal).try_normalize(f32::EPSILON).unwrap_or(normal);
                    let alpha = mesh.colors.as_ref().map_or(1.0, |colors| colors[index][3]);

                    ShadingAttribute::Normal {
                        normal: [normal_byte(normal.x), normal_byte(normal.y), normal_byte(normal.z)],
                        alpha: color_byte(alpha),
                    }
                }
                VertexType::Color => {
                    let color = mesh
                        .colors
                        .as_ref()
                        .map_or([0.0, 0.0, 0.0, 1.0], |colors| colors[index]);
                    ShadingAttribute::Color(color.map(color_byte))
                }
            };

            vertices.push(HardwareVertex { position, uv, shading });
        }

        let suffix = match vertex_type {
            VertexType::Normal => "normal",
            VertexType::Color => "color",
        };

        VertexBuffer {
            id,
            name: format!("{}_{}_vtx", mesh.name, suffix),
            mesh: mesh_id,
            vertex_type,
            vertices,
        }
    }
}

/// Round to the nearest short, returning the rounded value when it does not fit
pub fn to_fixed(value: f32) -> Result<i16, i64> {
    let rounded = (f64::from(value) + 0.5).floor() as i64;
    i16::try_from(rounded).map_err(|_| rounded)
}

fn clamp_i16(value: i64) -> i16 {
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

fn normal_byte(value: f32) -> i8 {
    ((value * 128.0) as i32).clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

fn color_byte(value: f32) -> u8 {
    ((value * 256.0) as i32).clamp(0, 255) as u8
}
