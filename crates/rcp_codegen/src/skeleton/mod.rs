//! Skeleton model
//!
//! The bone tree that skinned geometry is attached to. The compiler only reads
//! it: matrix stack traversal, batch bone pairs and transition costs are all
//! expressed in terms of [`BoneId`]s.

mod hierarchy;

pub use hierarchy::{Ancestors, Bone, BoneHierarchy, BoneId, SceneNode};

/// Bones a render batch is attached to
///
/// The first bone is always an ancestor of, or equal to, the second.
/// `(None, None)` is geometry not attached to any bone.
pub type BonePair = (Option<BoneId>, Option<BoneId>);
