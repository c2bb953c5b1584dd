//! Geometry emission for one batch
//!
//! Faces are packed into runs that fit the vertex cache. Each run loads the
//! vertices that are not already resident, moving the matrix stack to the
//! owning bone before each load, and then draws its faces from cache slots.

use std::collections::{BTreeSet, HashMap};

use crate::display_list::{Command, DisplayList};
use crate::error::CodegenResult;
use crate::foundation::collections::VertexBufferId;
use crate::geometry::SkinnedMesh;
use crate::pipeline::{PipelineState, VertexKey};
use crate::skeleton::{BoneHierarchy, BonePair};

/// Faces whose distinct vertices fit the cache together
#[derive(Debug, Default)]
struct Run {
    vertices: BTreeSet<u32>,
    faces: Vec<[u32; 3]>,
}

impl Run {
    fn novel_vertices(&self, face: &[u32; 3]) -> usize {
        let mut novel: Vec<u32> = face.iter().copied().filter(|index| !self.vertices.contains(index)).collect();
        novel.sort_unstable();
        novel.dedup();
        novel.len()
    }

    fn add(&mut self, face: [u32; 3]) {
        self.vertices.extend(face);
        self.faces.push(face);
    }

    fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Writes load and draw commands for batches against a simulated pipeline
pub struct GeometryEmitter<'a> {
    hierarchy: &'a BoneHierarchy,
    has_tri2: bool,
}

impl<'a> GeometryEmitter<'a> {
    /// Create an emitter
    pub fn new(hierarchy: &'a BoneHierarchy, has_tri2: bool) -> Self {
        Self { hierarchy, has_tri2 }
    }

    /// Emit every face of `mesh` attached to `bone_pair`
    pub fn emit_batch(
        &self,
        state: &mut PipelineState,
        mesh: &SkinnedMesh,
        bone_pair: BonePair,
        buffer: VertexBufferId,
        output: &mut DisplayList,
    ) -> CodegenResult<()> {
        let capacity = state.vertex_cache.capacity();
        let mut run = Run::default();

        for &face_index in mesh.faces_for_pair(bone_pair) {
            let face = mesh.faces[face_index].0;

            if run.vertices.len() + run.novel_vertices(&face) > capacity {
                self.flush(state, mesh, bone_pair, buffer, &run, output)?;
                run = Run::default();
            }

            run.add(face);
        }

        if !run.is_empty() {
            self.flush(state, mesh, bone_pair, buffer, &run, output)?;
        }

        Ok(())
    }

    fn flush(
        &self,
        state: &mut PipelineState,
        mesh: &SkinnedMesh,
        bone_pair: BonePair,
        buffer: VertexBufferId,
        run: &Run,
        output: &mut DisplayList,
    ) -> CodegenResult<()> {
        // vertices of the first bone load before the second bone's
        let mut vertices: Vec<u32> = run.vertices.iter().copied().collect();
        vertices.sort_by_key(|&index| (mesh.vertex_bone(index) != bone_pair.0, index));

        let keys: Vec<VertexKey> = vertices
            .iter()
            .map(|&index| VertexKey {
                buffer,
                index,
                matrix: mesh.vertex_bone(index),
            })
            .collect();
        let slots = state.vertex_cache.assign_slots(&keys)?;

        let pending: Vec<(VertexKey, usize)> = keys
            .iter()
            .zip(&slots)
            .filter(|(key, slot)| !state.vertex_cache.is_resident(**slot, key))
            .map(|(key, &slot)| (*key, slot))
            .collect();

        log::trace!(
            "Run of {} faces: {} vertices, {} already resident",
            run.faces.len(),
            keys.len(),
            keys.len() - pending.len()
        );

        for group in contiguous_loads(&pending) {
            let (first, first_slot) = group[0];
            state
                .matrix_stack
                .traverse_to_bone(self.hierarchy, first.matrix, output)?;

            output.push(Command::LoadVertices {
                buffer,
                source_offset: first.index,
                count: group.len() as u32,
                first_slot: first_slot as u32,
            });

            for &(key, slot) in group {
                state.vertex_cache.store(slot, key);
            }
        }

        let slot_of: HashMap<u32, u8> = vertices
            .iter()
            .zip(&slots)
            .map(|(&index, &slot)| (index, slot as u8))
            .collect();
        let triangle = |face: &[u32; 3]| face.map(|index| slot_of[&index]);

        if self.has_tri2 {
            for pair in run.faces.chunks(2) {
                match pair {
                    [first, second] => output.push(Command::Triangle2(triangle(first), triangle(second))),
                    [single] => output.push(Command::Triangle1(triangle(single))),
                    _ => {}
                }
            }
        } else {
            for face in &run.faces {
                output.push(Command::Triangle1(triangle(face)));
            }
        }

        Ok(())
    }
}

/// Split pending loads into groups with consecutive source indices and
/// destination slots that share one owning bone
fn contiguous_loads(pending: &[(VertexKey, usize)]) -> Vec<&[(VertexKey, usize)]> {
    let mut groups = Vec::new();
    let mut start = 0;

    for end in 1..=pending.len() {
        let split = end == pending.len() || {
            let (previous, previous_slot) = pending[end - 1];
            let (next, next_slot) = pending[end];
            next.index != previous.index + 1 || next_slot != previous_slot + 1 || next.matrix != previous.matrix
        };

        if split && start < end {
            groups.push(&pending[start..end]);
            start = end;
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayListSettings;
    use crate::foundation::math::{Transform, Vec3};
    use crate::geometry::Face;
    use crate::material::MaterialState;
    use std::collections::BTreeMap;

    /// `count` triangles sharing no vertices
    fn triangle_soup(count: u32) -> SkinnedMesh {
        let positions = (0..count * 3).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let faces = (0..count).map(|i| Face([i * 3, i * 3 + 1, i * 3 + 2])).collect();
        SkinnedMesh::new("soup", positions, faces, "default")
    }

    fn state(settings: &DisplayListSettings) -> PipelineState {
        PipelineState::new(settings, MaterialState::default())
    }

    fn loads(list: &DisplayList) -> Vec<(u32, u32, u32)> {
        list.commands()
            .iter()
            .filter_map(|command| match command {
                Command::LoadVertices {
                    source_offset,
                    count,
                    first_slot,
                    ..
                } => Some((*source_offset, *count, *first_slot)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_runs_split_at_cache_size() {
        let settings = DisplayListSettings::default();
        let hierarchy = BoneHierarchy::new();
        let mesh = triangle_soup(40);

        for (has_tri2, draws) in [(true, 20), (false, 40)] {
            let mut state = state(&settings);
            let mut list = DisplayList::new("soup");

            GeometryEmitter::new(&hierarchy, has_tri2)
                .emit_batch(&mut state, &mesh, (None, None), VertexBufferId(0), &mut list)
                .unwrap();

            assert!(loads(&list).len() >= 4);
            assert_eq!(list.count(|command| command.triangle_count() > 0), draws);
            assert_eq!(list.triangle_count(), 40);
        }
    }

    #[test]
    fn test_draws_only_reference_loaded_slots() {
        let settings = DisplayListSettings::default().with_vertex_cache_size(8);
        let hierarchy = BoneHierarchy::new();
        let mesh = triangle_soup(7);
        let mut state = state(&settings);
        let mut list = DisplayList::new("soup");

        GeometryEmitter::new(&hierarchy, true)
            .emit_batch(&mut state, &mesh, (None, None), VertexBufferId(0), &mut list)
            .unwrap();

        let mut loaded = [false; 8];
        for command in list.commands() {
            match command {
                Command::LoadVertices { count, first_slot, .. } => {
                    assert!(first_slot + count <= 8);
                    for slot in *first_slot..first_slot + count {
                        loaded[slot as usize] = true;
                    }
                }
                Command::Triangle1(face) => assert!(face.iter().all(|&slot| loaded[slot as usize])),
                Command::Triangle2(a, b) => {
                    assert!(a.iter().chain(b).all(|&slot| loaded[slot as usize]));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_shared_vertices_are_not_reloaded() {
        let settings = DisplayListSettings::default();
        let hierarchy = BoneHierarchy::new();
        let positions = (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mesh = SkinnedMesh::new("quad", positions, vec![Face([0, 1, 2]), Face([2, 1, 3])], "default");
        let mut state = state(&settings);

        let mut first = DisplayList::new("quad");
        let emitter = GeometryEmitter::new(&hierarchy, true);
        emitter
            .emit_batch(&mut state, &mesh, (None, None), VertexBufferId(0), &mut first)
            .unwrap();
        assert_eq!(loads(&first), vec![(0, 4, 0)]);

        let mut second = DisplayList::new("quad");
        emitter
            .emit_batch(&mut state, &mesh, (None, None), VertexBufferId(0), &mut second)
            .unwrap();
        assert!(loads(&second).is_empty());
        assert_eq!(second.triangle_count(), 2);
    }

    #[test]
    fn test_spanning_batch_loads_parent_vertices_first() {
        let settings = DisplayListSettings::default();
        let mut hierarchy = BoneHierarchy::new();
        let upper = hierarchy.add_bone("upper", None, Transform::identity());
        let lower = hierarchy.add_bone("lower", Some(upper), Transform::identity());

        let positions = (0..3).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mesh = SkinnedMesh::new("elbow", positions, vec![Face([0, 1, 2])], "default").with_skin(
            &hierarchy,
            vec![Some(lower), Some(upper), Some(lower)],
            BTreeMap::new(),
        );

        let mut state = state(&settings);
        let mut list = DisplayList::new("elbow");
        GeometryEmitter::new(&hierarchy, true)
            .emit_batch(&mut state, &mesh, (Some(upper), Some(lower)), VertexBufferId(0), &mut list)
            .unwrap();

        assert_eq!(loads(&list), vec![(1, 1, 0), (0, 1, 1), (2, 1, 2)]);
        assert_eq!(
            list.count(|command| matches!(command, Command::PushMatrix { .. })),
            2
        );
        assert_eq!(state.matrix_stack.top(), Some(lower));
        assert_eq!(list.commands().last(), Some(&Command::Triangle1([1, 0, 2])));
    }

    #[test]
    fn test_contiguous_loads_split_on_gaps_and_bones() {
        let key = |index, matrix| VertexKey {
            buffer: VertexBufferId(0),
            index,
            matrix,
        };
        let pending = vec![
            (key(0, None), 0),
            (key(1, None), 1),
            (key(3, None), 2),
            (key(4, Some(crate::skeleton::BoneId(0))), 3),
        ];

        let groups = contiguous_loads(&pending);

        assert_eq!(groups.iter().map(|group| group.len()).collect::<Vec<_>>(), vec![2, 1, 1]);
    }
}
