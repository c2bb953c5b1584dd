//! Vertex cache slot allocation

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{CodegenError, CodegenResult};
use crate::foundation::collections::VertexBufferId;
use crate::skeleton::BoneId;

/// Identity of a vertex as it sits in a cache slot
///
/// The same source vertex transformed by a different matrix is a different
/// cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey {
    /// Buffer the vertex was loaded from
    pub buffer: VertexBufferId,
    /// Index inside the buffer
    pub index: u32,
    /// Bone whose matrix was on top of the stack at load time
    pub matrix: Option<BoneId>,
}

/// Simulated contents of the hardware vertex cache
#[derive(Debug, Clone)]
pub struct VertexCache {
    slots: Vec<Option<VertexKey>>,
}

impl VertexCache {
    /// Create an empty cache with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Content of a slot
    pub fn slot(&self, slot: usize) -> Option<&VertexKey> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Whether `slot` already holds `key`
    pub fn is_resident(&self, slot: usize, key: &VertexKey) -> bool {
        self.slot(slot) == Some(key)
    }

    /// Choose a slot for every requested vertex
    ///
    /// Vertices already resident keep their slot; the rest fill the remaining
    /// slots in index order. The returned vector is parallel to `requested`.
    /// Does not modify the cache; call [`VertexCache::store`] for each load.
    pub fn assign_slots(&self, requested: &[VertexKey]) -> CodegenResult<Vec<usize>> {
        let overflow = || CodegenError::CacheOverflow {
            requested: requested.len(),
            capacity: self.capacity(),
        };

        if requested.len() > self.capacity() {
            return Err(overflow());
        }

        let positions: HashMap<&VertexKey, usize> =
            requested.iter().enumerate().map(|(position, key)| (key, position)).collect();
        debug_assert_eq!(positions.len(), requested.len(), "requested vertices must be distinct");

        let mut mapping: Vec<Option<usize>> = vec![None; requested.len()];
        let mut kept = vec![false; self.capacity()];

        for (slot, content) in self.slots.iter().enumerate() {
            let Some(position) = content.as_ref().and_then(|key| positions.get(key)) else {
                continue;
            };

            if mapping[*position].is_none() {
                mapping[*position] = Some(slot);
                kept[slot] = true;
            }
        }

        let mut free_slots = (0..self.capacity()).filter(|&slot| !kept[slot]);

        mapping
            .into_iter()
            .map(|slot| slot.or_else(|| free_slots.next()))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(overflow)
    }

    /// Record that `key` was loaded into `slot`
    pub fn store(&mut self, slot: usize, key: VertexKey) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(key);
        }
    }

    /// Forget the contents of a range of slots
    pub fn invalidate(&mut self, range: Range<usize>) {
        let end = range.end.min(self.slots.len());
        for entry in &mut self.slots[range.start.min(end)..end] {
            *entry = None;
        }
    }
}
