//! Matrix stack simulation
//!
//! The stack always holds a chain of bones starting at a root bone, so moving
//! to another bone means popping the part of the chain that is not an
//! ancestor of the target and pushing the missing path below it.

use crate::display_list::{Command, DisplayList};
use crate::error::{CodegenError, CodegenResult};
use crate::skeleton::{BoneHierarchy, BoneId};

/// Number of pops and pushes needed to move the stack from one bone to another
pub fn traversal_counts(hierarchy: &BoneHierarchy, from: Option<BoneId>, to: Option<BoneId>) -> (usize, usize) {
    let common = hierarchy.depth(hierarchy.common_ancestor(from, to));
    (hierarchy.depth(from) - common, hierarchy.depth(to) - common)
}

/// Simulated hardware matrix stack
#[derive(Debug, Clone)]
pub struct MatrixStack {
    bones: Vec<BoneId>,
    max_depth: usize,
    can_pop_multiple: bool,
}

impl MatrixStack {
    /// Create an empty stack
    pub fn new(max_depth: usize, can_pop_multiple: bool) -> Self {
        Self {
            bones: Vec::new(),
            max_depth,
            can_pop_multiple,
        }
    }

    /// Bones currently pushed, bottom first
    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    /// Bone on top of the stack, `None` when empty
    pub fn top(&self) -> Option<BoneId> {
        self.bones.last().copied()
    }

    /// Number of pushed matrices
    pub fn depth(&self) -> usize {
        self.bones.len()
    }

    /// Make `target` the top of the stack
    ///
    /// Fails with [`CodegenError::MatrixStackOverflow`] before emitting or
    /// changing anything if the path to `target` is deeper than the limit.
    pub fn traverse_to_bone(
        &mut self,
        hierarchy: &BoneHierarchy,
        target: Option<BoneId>,
        output: &mut DisplayList,
    ) -> CodegenResult<()> {
        let path = hierarchy.path_from_root(target);

        if path.len() > self.max_depth {
            return Err(CodegenError::MatrixStackOverflow {
                chain: path
                    .iter()
                    .map(|&bone| hierarchy.name_of(Some(bone)).to_string())
                    .collect(),
                required: path.len(),
                max_depth: self.max_depth,
            });
        }

        let kept = self
            .bones
            .iter()
            .zip(&path)
            .take_while(|(pushed, wanted)| pushed == wanted)
            .count();

        let pops = self.bones.len() - kept;
        if pops > 0 {
            if self.can_pop_multiple {
                output.push(Command::PopMatrix { count: pops });
            } else {
                for _ in 0..pops {
                    output.push(Command::PopMatrix { count: 1 });
                }
            }
            self.bones.truncate(kept);
        }

        for &bone in &path[kept..] {
            output.push(Command::Comment(hierarchy.name_of(Some(bone)).to_string()));
            output.push(Command::PushMatrix { bone });
            self.bones.push(bone);
        }

        Ok(())
    }
}
