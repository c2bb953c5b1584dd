//! Shared material display lists
//!
//! A material drawn by several batches, or by batches of more than one unit,
//! is written once as a standalone list and called from every unit instead of
//! being inlined each time.

use std::collections::HashMap;

use crate::batch::RenderBatch;
use crate::display_list::DisplayList;
use crate::foundation::collections::MaterialKey;
use crate::material::{diff, MaterialLibrary, MaterialState};

/// Counts material use across every unit of an export
#[derive(Debug, Default)]
pub struct MaterialCollector {
    use_counts: HashMap<MaterialKey, usize>,
    unit_count: usize,
}

impl MaterialCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the batches of one unit
    pub fn collect_unit(&mut self, batches: &[RenderBatch]) {
        for material in batches.iter().filter_map(|batch| batch.material) {
            *self.use_counts.entry(material).or_insert(0) += 1;
        }
        self.unit_count += 1;
    }

    /// Batches drawn with `material` so far
    pub fn use_count(&self, material: MaterialKey) -> usize {
        self.use_counts.get(&material).copied().unwrap_or(0)
    }

    /// Whether `material` gets a standalone list
    pub fn is_shared(&self, material: MaterialKey) -> bool {
        let count = self.use_count(material);
        count > 1 || (count > 0 && self.unit_count > 1)
    }

    /// Build the standalone list of every shared material
    ///
    /// Each list moves the registers from `default` to the material; callers
    /// restore the material's fields to `default` before calling it.
    pub fn build_shared(&self, library: &MaterialLibrary, default: &MaterialState) -> SharedMaterials {
        let mut shared = SharedMaterials::default();

        for (key, material) in library.iter().filter(|(key, _)| self.is_shared(*key)) {
            let name = shared.unique_name(&format!("{}_material", c_identifier(&material.name)));
            let baseline = default.restricted_to(&material.state);

            shared.names.insert(key, name.clone());
            shared
                .lists
                .push(DisplayList::with_commands(name, diff(&baseline, &material.state)));
        }

        log::debug!("{} of {} used materials are shared", shared.lists.len(), self.use_counts.len());

        shared
    }
}

/// Standalone material lists and the names units call them by
#[derive(Debug, Clone, Default)]
pub struct SharedMaterials {
    names: HashMap<MaterialKey, String>,
    lists: Vec<DisplayList>,
}

impl SharedMaterials {
    /// List name for a shared material
    pub fn name_of(&self, material: MaterialKey) -> Option<&str> {
        self.names.get(&material).map(String::as_str)
    }

    /// Generated lists
    pub fn lists(&self) -> &[DisplayList] {
        &self.lists
    }

    /// Take ownership of the generated lists
    pub fn into_lists(self) -> Vec<DisplayList> {
        self.lists
    }

    fn unique_name(&self, requested: &str) -> String {
        let taken = |name: &str| self.lists.iter().any(|list| list.name() == name);

        if !taken(requested) {
            return requested.to_string();
        }

        (1..)
            .map(|index| format!("{requested}_{index}"))
            .find(|name| !taken(name))
            .unwrap_or_else(|| requested.to_string())
    }
}

/// Replace characters that cannot appear in a C symbol
pub fn c_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }

    result
}
