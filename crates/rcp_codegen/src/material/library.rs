//! Resolved materials, keyed by stable handles
//!
//! Material text parsing happens upstream; the library only stores the
//! resulting states and hands out [`MaterialKey`]s so batches can refer to a
//! material without borrowing the library.

use std::collections::HashMap;

use super::state::MaterialState;
use crate::foundation::collections::{HandleMap, MaterialKey};

/// Property giving the world-space size of one texture repeat along S
pub const TILE_SIZE_S_PROPERTY: &str = "tile_size_s";
/// Property giving the world-space size of one texture repeat along T
pub const TILE_SIZE_T_PROPERTY: &str = "tile_size_t";

/// A named material state plus free-form properties
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name as referenced by meshes
    pub name: String,
    /// Registers the material sets
    pub state: MaterialState,
    /// Extra key/value properties from the material description
    pub properties: HashMap<String, String>,
}

impl Material {
    /// Create a material without properties
    pub fn new(name: impl Into<String>, state: MaterialState) -> Self {
        Self {
            name: name.into(),
            state,
            properties: HashMap::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Property value by key
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Texture repeat size for automatic UV projection
    ///
    /// `tile_size_t` defaults to `tile_size_s`. Unparseable or non-positive
    /// values disable projection.
    pub fn tile_size(&self) -> Option<(f32, f32)> {
        let parse = |key: &str| {
            self.property(key)
                .and_then(|value| value.trim().parse::<f32>().ok())
                .filter(|size| size.is_finite() && *size > 0.0)
        };

        let s = parse(TILE_SIZE_S_PROPERTY)?;
        let t = parse(TILE_SIZE_T_PROPERTY).unwrap_or(s);
        Some((s, t))
    }
}

/// Every material available to a scene
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: HandleMap<MaterialKey, Material>,
    by_name: HashMap<String, MaterialKey>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material, replacing any material with the same name
    pub fn insert(&mut self, material: Material) -> MaterialKey {
        if let Some(&key) = self.by_name.get(&material.name) {
            self.materials[key] = material;
            return key;
        }

        let name = material.name.clone();
        let key = self.materials.insert(material);
        self.by_name.insert(name, key);
        key
    }

    /// Material by handle
    pub fn get(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Handle of a material by name
    pub fn key_of(&self, name: &str) -> Option<MaterialKey> {
        self.by_name.get(name).copied()
    }

    /// Handle for a mesh's material, honoring a global override
    pub fn resolve(&self, name: &str, force: Option<&str>) -> Option<MaterialKey> {
        self.key_of(force.unwrap_or(name))
    }

    /// State of a material, or the all-unknown state when it is missing
    pub fn state_of(&self, key: Option<MaterialKey>) -> MaterialState {
        key.and_then(|key| self.get(key))
            .map(|material| material.state.clone())
            .unwrap_or_default()
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// All materials with their handles
    pub fn iter(&self) -> impl Iterator<Item = (MaterialKey, &Material)> {
        self.materials.iter()
    }
}
