//! Meshes annotated with bone ownership
//!
//! Every vertex is owned by at most one bone. Faces are pre-partitioned into
//! single-bone groups and bone-spanning groups so that render batches can be
//! cut along bone boundaries.

use std::collections::BTreeMap;

use crate::foundation::math::{utils, Mat4, Point3, Vec2, Vec3};
use crate::skeleton::{BoneHierarchy, BoneId, BonePair};

/// A triangle as three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face(pub [u32; 3]);

impl Face {
    /// Vertex indices of the face
    pub fn indices(&self) -> &[u32; 3] {
        &self.0
    }
}

/// Mesh plus per-vertex bone ownership and precomputed face groups
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    /// Mesh name, used to name vertex buffers
    pub name: String,
    /// Vertex positions in model space
    pub positions: Vec<Vec3>,
    /// Optional per-vertex normals
    pub normals: Option<Vec<Vec3>>,
    /// Optional per-vertex texture coordinates
    pub uvs: Option<Vec<Vec2>>,
    /// Optional per-vertex RGBA colors in `0.0..=1.0`
    pub colors: Option<Vec<[f32; 4]>>,
    /// Triangles
    pub faces: Vec<Face>,
    /// Name of the material the importer assigned
    pub material_name: String,
    vertex_bones: Vec<Option<BoneId>>,
    bone_offsets: BTreeMap<BoneId, Mat4>,
    faces_for_bone: BTreeMap<Option<BoneId>, Vec<usize>>,
    bone_spanning_faces: BTreeMap<BonePair, Vec<usize>>,
}

impl SkinnedMesh {
    /// Create an unskinned mesh; every face lands in the `None` bone group
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        faces: Vec<Face>,
        material_name: impl Into<String>,
    ) -> Self {
        let vertex_count = positions.len();
        let mut mesh = Self {
            name: name.into(),
            positions,
            normals: None,
            uvs: None,
            colors: None,
            faces,
            material_name: material_name.into(),
            vertex_bones: vec![None; vertex_count],
            bone_offsets: BTreeMap::new(),
            faces_for_bone: BTreeMap::new(),
            bone_spanning_faces: BTreeMap::new(),
        };
        mesh.faces_for_bone.insert(None, (0..mesh.faces.len()).collect());
        mesh
    }

    /// Attach normals
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach texture coordinates
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Attach vertex colors
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Assign vertex ownership and regroup faces along bone boundaries
    ///
    /// `bone_offsets` maps a bone to the matrix taking model space into that
    /// bone's local space; vertices are exported relative to their owner.
    pub fn with_skin(
        mut self,
        hierarchy: &BoneHierarchy,
        vertex_bones: Vec<Option<BoneId>>,
        bone_offsets: BTreeMap<BoneId, Mat4>,
    ) -> Self {
        debug_assert_eq!(vertex_bones.len(), self.positions.len());
        self.vertex_bones = vertex_bones;
        self.bone_offsets = bone_offsets;
        self.populate_face_groups(hierarchy);
        self
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Owning bone of a vertex
    pub fn vertex_bone(&self, vertex: u32) -> Option<BoneId> {
        self.vertex_bones.get(vertex as usize).copied().flatten()
    }

    /// Model-to-bone matrix for a bone, if the mesh is skinned to it
    pub fn bone_offset(&self, bone: BoneId) -> Option<&Mat4> {
        self.bone_offsets.get(&bone)
    }

    /// Whether any vertex is attached to a bone
    pub fn is_skinned(&self) -> bool {
        self.vertex_bones.iter().any(Option::is_some)
    }

    /// Faces whose vertices all belong to one bone, keyed by that bone
    pub fn faces_for_bone(&self) -> &BTreeMap<Option<BoneId>, Vec<usize>> {
        &self.faces_for_bone
    }

    /// Faces spanning an ancestor/descendant bone pair
    pub fn bone_spanning_faces(&self) -> &BTreeMap<BonePair, Vec<usize>> {
        &self.bone_spanning_faces
    }

    /// Faces drawn by a batch with the given bone pair
    pub fn faces_for_pair(&self, pair: BonePair) -> &[usize] {
        let group = if pair.0 == pair.1 {
            self.faces_for_bone.get(&pair.0)
        } else {
            self.bone_spanning_faces.get(&pair)
        };
        group.map_or(&[], Vec::as_slice)
    }

    /// Axis-aligned bounds of all positions
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().skip(1).fold((first, first), |(min, max), p| {
            (utils::component_min(&min, p), utils::component_max(&max, p))
        }))
    }

    /// Copy of this mesh with positions and normals transformed
    pub fn transformed(&self, transform: &Mat4) -> SkinnedMesh {
        let mut result = self.clone();
        let rotation = transform.fixed_view::<3, 3>(0, 0).into_owned();

        for position in &mut result.positions {
            *position = transform.transform_point(&Point3::from(*position)).coords;
        }

        if let Some(normals) = &mut result.normals {
            for normal in normals.iter_mut() {
                *normal = (rotation * *normal).try_normalize(f32::EPSILON).unwrap_or(*normal);
            }
        }

        result
    }

    fn is_face_one_bone(&self, face: &Face) -> bool {
        let [a, b, c] = face.0;
        let bone = self.vertex_bone(a);
        self.vertex_bone(b) == bone && self.vertex_bone(c) == bone
    }

    /// Ancestor bone of the face and the ancestor's child towards the other vertices
    fn transition_pair(&self, hierarchy: &BoneHierarchy, face: &Face) -> BonePair {
        let ancestor = face
            .0
            .iter()
            .skip(1)
            .fold(self.vertex_bone(face.0[0]), |ancestor, &vertex| {
                hierarchy.common_ancestor(ancestor, self.vertex_bone(vertex))
            });

        let second = face
            .0
            .iter()
            .map(|&vertex| self.vertex_bone(vertex))
            .find(|&bone| bone != ancestor)
            .map_or(ancestor, |bone| hierarchy.step_down_towards(ancestor, bone));

        (ancestor, second)
    }

    fn populate_face_groups(&mut self, hierarchy: &BoneHierarchy) {
        self.faces_for_bone.clear();
        self.bone_spanning_faces.clear();

        for (index, face) in self.faces.iter().enumerate() {
            if self.is_face_one_bone(face) {
                self.faces_for_bone
                    .entry(self.vertex_bone(face.0[0]))
                    .or_default()
                    .push(index);
            } else {
                let pair = self.transition_pair(hierarchy, face);
                self.bone_spanning_faces.entry(pair).or_default().push(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn quad_strip() -> SkinnedMesh {
        // 0-1-2 on the upper arm, 3 on the forearm, 4 on the hand
        let positions = (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let faces = vec![Face([0, 1, 2]), Face([1, 2, 3]), Face([2, 3, 4])];
        SkinnedMesh::new("arm", positions, faces, "skin")
    }

    #[test]
    fn test_unskinned_mesh_has_single_group() {
        let mesh = quad_strip();
        assert_eq!(mesh.faces_for_pair((None, None)), &[0, 1, 2]);
        assert!(mesh.bone_spanning_faces().is_empty());
        assert!(!mesh.is_skinned());
    }

    #[test]
    fn test_faces_grouped_by_bone_pair() {
        let mut hierarchy = BoneHierarchy::new();
        let upper = hierarchy.add_bone("upper", None, Transform::identity());
        let fore = hierarchy.add_bone("fore", Some(upper), Transform::identity());
        let hand = hierarchy.add_bone("hand", Some(fore), Transform::identity());

        let bones = vec![Some(upper), Some(upper), Some(upper), Some(fore), Some(hand)];
        let mesh = quad_strip().with_skin(&hierarchy, bones, BTreeMap::new());

        assert_eq!(mesh.faces_for_pair((Some(upper), Some(upper))), &[0]);
        // upper + fore + hand: ancestor is upper, stepping down towards fore
        assert_eq!(mesh.faces_for_pair((Some(upper), Some(fore))), &[1, 2]);
        assert!(mesh.faces_for_pair((Some(fore), Some(hand))).is_empty());
        assert_eq!(mesh.bone_spanning_faces().len(), 1);
        assert_eq!(mesh.faces_for_bone().len(), 1);

        let spanning: usize = mesh.bone_spanning_faces().values().map(Vec::len).sum();
        let single: usize = mesh.faces_for_bone().values().map(Vec::len).sum();
        assert_eq!(spanning + single, 3);
    }

    #[test]
    fn test_transformed_rotates_normals() {
        let mesh = SkinnedMesh::new("tri", vec![Vec3::new(1.0, 0.0, 0.0); 3], vec![Face([0, 1, 2])], "m")
            .with_normals(vec![Vec3::new(1.0, 0.0, 0.0); 3]);
        let rotation = utils::rotation_from_euler_degrees([0.0, 0.0, 90.0]).to_homogeneous();
        let moved = mesh.transformed(&(Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0)) * rotation));

        assert_relative_eq!(moved.positions[0], Vec3::new(0.0, 1.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(moved.normals.unwrap()[0], Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_bounding_box() {
        let (min, max) = quad_strip().bounding_box().unwrap();
        assert_relative_eq!(min, Vec3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(max, Vec3::new(4.0, 0.0, 0.0));
    }
}
