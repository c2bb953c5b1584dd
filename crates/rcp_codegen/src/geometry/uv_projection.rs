//! Automatic texture coordinates for tiled materials
//!
//! Each group of faces connected through shared vertices is projected onto
//! the axis-aligned plane that best matches the group's average normal.

use std::collections::BTreeMap;

use super::mesh::SkinnedMesh;
use crate::foundation::math::{Vec2, Vec3};

/// Minimum normal component for a group to count as facing that axis
const AXIS_THRESHOLD: f32 = 0.7;

/// Union-find over vertex indices
struct VertexGroups {
    parent: Vec<usize>,
}

impl VertexGroups {
    fn new(count: usize) -> Self {
        Self {
            parent: (0..count).collect(),
        }
    }

    fn find(&mut self, mut vertex: usize) -> usize {
        while self.parent[vertex] != vertex {
            self.parent[vertex] = self.parent[self.parent[vertex]];
            vertex = self.parent[vertex];
        }
        vertex
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent[b.max(a)] = a.min(b);
        }
    }
}

/// Faces grouped by vertex connectivity, in order of first appearance
pub fn connected_face_groups(mesh: &SkinnedMesh) -> Vec<Vec<usize>> {
    let mut groups = VertexGroups::new(mesh.vertex_count());

    for face in &mesh.faces {
        let [a, b, c] = face.0.map(|index| index as usize);
        groups.union(a, b);
        groups.union(a, c);
    }

    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut order = Vec::new();

    for (index, face) in mesh.faces.iter().enumerate() {
        let root = groups.find(face.0[0] as usize);
        let entry = by_root.entry(root).or_default();
        if entry.is_empty() {
            order.push(root);
        }
        entry.push(index);
    }

    order
        .into_iter()
        .filter_map(|root| by_root.remove(&root))
        .collect()
}

/// Summed normal of a face group, from vertex normals or face winding
fn group_normal(mesh: &SkinnedMesh, faces: &[usize]) -> Vec3 {
    let sum: Vec3 = faces
        .iter()
        .map(|&face| {
            let indices = mesh.faces[face].0.map(|index| index as usize);
            match &mesh.normals {
                Some(normals) => indices.iter().map(|&index| normals[index]).sum(),
                None => {
                    let [a, b, c] = indices.map(|index| mesh.positions[index]);
                    (b - a).cross(&(c - a))
                }
            }
        })
        .sum();

    sum.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
}

/// Projection axes `(left, up)` for a group normal
fn projection_axes(normal: &Vec3) -> (Vec3, Vec3) {
    if normal.y.abs() > AXIS_THRESHOLD {
        (Vec3::x(), Vec3::z())
    } else if normal.z.abs() > AXIS_THRESHOLD {
        (Vec3::x(), Vec3::y())
    } else {
        (Vec3::z(), Vec3::y())
    }
}

/// Replace the mesh's texture coordinates with a per-group planar projection
///
/// `s_scale` and `t_scale` convert model units into texture repeats.
pub fn cube_project_uvs(mesh: &mut SkinnedMesh, s_scale: f32, t_scale: f32) {
    let mut uvs = mesh
        .uvs
        .take()
        .unwrap_or_else(|| vec![Vec2::zeros(); mesh.vertex_count()]);

    for faces in connected_face_groups(mesh) {
        let (left, up) = projection_axes(&group_normal(mesh, &faces));

        let vertices: Vec<usize> = faces
            .iter()
            .flat_map(|&face| mesh.faces[face].0)
            .map(|index| index as usize)
            .collect();

        let (min_left, min_up) = vertices.iter().fold((f32::MAX, f32::MAX), |(min_left, min_up), &index| {
            let position = &mesh.positions[index];
            (min_left.min(position.dot(&left)), min_up.min(position.dot(&up)))
        });

        for index in vertices {
            let position = &mesh.positions[index];
            uvs[index] = Vec2::new(
                (position.dot(&left) - min_left) * s_scale,
                (position.dot(&up) - min_up) * t_scale,
            );
        }
    }

    mesh.uvs = Some(uvs);
}
