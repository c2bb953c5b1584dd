//! Bone hierarchy stored as an arena
//!
//! Bones reference their parent by [`BoneId`]. `None` stands for the model root,
//! i.e. geometry that is not attached to any bone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Quat, Transform};

/// Index of a bone inside its [`BoneHierarchy`]
///
/// Ids are assigned in pre-order, so a parent always has a smaller id than its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub usize);

impl BoneId {
    /// Position of the bone in the hierarchy
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single bone
#[derive(Debug, Clone)]
pub struct Bone {
    id: BoneId,
    name: String,
    parent: Option<BoneId>,
    rest: Transform,
    children: Vec<BoneId>,
}

impl Bone {
    /// Id of this bone
    pub fn id(&self) -> BoneId {
        self.id
    }

    /// Name of the bone as imported
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent bone, `None` for a root bone
    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    /// Rest pose relative to the parent
    pub fn rest(&self) -> &Transform {
        &self.rest
    }

    /// Direct children in creation order
    pub fn children(&self) -> &[BoneId] {
        &self.children
    }
}

/// Node of an imported scene graph, used to discover bones
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name, matched against the set of known bone names
    pub name: String,
    /// Local transform relative to the parent node
    pub transform: Mat4,
    /// Indices of child nodes in the same node list
    pub children: Vec<usize>,
}

/// Owner of every bone in a model
#[derive(Debug, Clone, Default)]
pub struct BoneHierarchy {
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
}

impl BoneHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone under `parent`
    ///
    /// # Panics
    /// If `parent` does not refer to an existing bone.
    pub fn add_bone(&mut self, name: impl Into<String>, parent: Option<BoneId>, rest: Transform) -> BoneId {
        let id = BoneId(self.bones.len());
        let name = name.into();

        if let Some(parent) = parent {
            assert!(parent.index() < self.bones.len(), "parent {parent:?} does not exist");
            self.bones[parent.index()].children.push(id);
        }

        self.by_name.insert(name.clone(), id);
        self.bones.push(Bone {
            id,
            name,
            parent,
            rest,
            children: Vec::new(),
        });

        id
    }

    /// Discover bones in an imported node graph
    ///
    /// Walks the graph in pre-order with an explicit stack. Every node whose name
    /// satisfies `is_bone` becomes a bone parented to the nearest bone above it;
    /// other nodes are transparent.
    pub fn from_scene_nodes(nodes: &[SceneNode], root: usize, is_bone: impl Fn(&str) -> bool) -> Self {
        let mut hierarchy = Self::new();
        let mut worklist: Vec<(usize, Option<BoneId>)> = vec![(root, None)];

        while let Some((node_index, bone_parent)) = worklist.pop() {
            let Some(node) = nodes.get(node_index) else {
                log::warn!("Scene node {node_index} referenced but not present");
                continue;
            };

            let mut parent_for_children = bone_parent;

            if is_bone(&node.name) {
                let rest = Transform::from_matrix(&node.transform);
                parent_for_children = Some(hierarchy.add_bone(node.name.clone(), bone_parent, rest));
            }

            // reversed so the first child is visited first
            for &child in node.children.iter().rev() {
                worklist.push((child, parent_for_children));
            }
        }

        log::debug!("Discovered {} bones", hierarchy.len());

        hierarchy
    }

    /// Number of bones
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the model has no bones
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Bone by id
    pub fn get(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    /// Bone by name
    pub fn by_name(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    /// All bones in id order
    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    /// Name of a bone, or `"<root>"` for no bone
    pub fn name_of(&self, bone: Option<BoneId>) -> &str {
        bone.and_then(|id| self.get(id)).map_or("<root>", Bone::name)
    }

    /// Parent of a bone; the root's parent is the root
    pub fn parent_of(&self, bone: Option<BoneId>) -> Option<BoneId> {
        bone.and_then(|id| self.get(id)).and_then(Bone::parent)
    }

    /// Iterate from `bone` up to its root bone, inclusive
    pub fn ancestors(&self, bone: Option<BoneId>) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            current: bone,
        }
    }

    /// Number of bones between the model root and `bone`, inclusive
    pub fn depth(&self, bone: Option<BoneId>) -> usize {
        self.ancestors(bone).count()
    }

    /// Bones from the root down to `bone`, inclusive
    pub fn path_from_root(&self, bone: Option<BoneId>) -> Vec<BoneId> {
        let mut path: Vec<BoneId> = self.ancestors(bone).collect();
        path.reverse();
        path
    }

    /// Whether `ancestor` is `descendant` or one of its ancestors
    ///
    /// The model root (`None`) is an ancestor of everything.
    pub fn is_ancestor_or_self(&self, ancestor: Option<BoneId>, descendant: Option<BoneId>) -> bool {
        match ancestor {
            None => true,
            Some(ancestor) => self.ancestors(descendant).any(|bone| bone == ancestor),
        }
    }

    /// Deepest bone that is an ancestor of (or equal to) both `a` and `b`
    pub fn common_ancestor(&self, a: Option<BoneId>, b: Option<BoneId>) -> Option<BoneId> {
        let b_chain: Vec<BoneId> = self.ancestors(b).collect();
        self.ancestors(a).find(|bone| b_chain.contains(bone))
    }

    /// The child of `ancestor` on the path towards `descendant`
    ///
    /// Assumes `ancestor` is an ancestor of `descendant`. Returns `descendant`
    /// itself when it is a direct child, and `None` when the two are equal.
    pub fn step_down_towards(&self, ancestor: Option<BoneId>, descendant: Option<BoneId>) -> Option<BoneId> {
        if ancestor == descendant {
            return None;
        }

        self.ancestors(descendant)
            .find(|&bone| self.parent_of(Some(bone)) == ancestor)
    }

    /// Rest poses re-expressed in the export coordinate frame
    ///
    /// Root bones are rotated by the global rotation; every position is scaled.
    pub fn rest_transforms(&self, scale: f32, rotation: &Quat) -> Vec<Transform> {
        self.bones
            .iter()
            .map(|bone| {
                if bone.parent.is_some() {
                    bone.rest.reframed(&Quat::identity(), scale)
                } else {
                    bone.rest.reframed(rotation, scale)
                }
            })
            .collect()
    }
}

/// Iterator over a bone and its ancestors
pub struct Ancestors<'a> {
    hierarchy: &'a BoneHierarchy,
    current: Option<BoneId>,
}

impl Iterator for Ancestors<'_> {
    type Item = BoneId;

    fn next(&mut self) -> Option<BoneId> {
        let current = self.current?;
        self.current = self.hierarchy.parent_of(Some(current));
        Some(current)
    }
}
