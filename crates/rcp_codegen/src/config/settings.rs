//! # Display List Settings
//!
//! Hardware capabilities and export parameters for one compilation run.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::math::{utils, Mat4, Quat};
use crate::material::TransitionTiming;
use crate::pipeline::MAX_VERTEX_CACHE_SIZE;

/// Default branch-and-bound iteration budget
pub const DEFAULT_MAX_OPTIMIZATION_ITERATIONS: usize = 1000;

/// Settings that shape the generated command stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayListSettings {
    /// Number of vertex cache slots the microcode exposes
    pub vertex_cache_size: usize,
    /// Whether the microcode supports drawing two triangles per command
    pub has_tri2: bool,
    /// Maximum depth of the modelview matrix stack
    pub max_matrix_depth: usize,
    /// Whether a single pop command can remove several matrices
    pub can_pop_multiple_matrices: bool,
    /// Iteration budget for the batch order search
    pub max_optimization_iterations: usize,
    /// Scale from model units to fixed-point vertex units
    pub fixed_point_scale: f32,
    /// Global model scale applied before the fixed-point scale
    pub model_scale: f32,
    /// Global model rotation as XYZ euler angles in degrees
    pub model_rotation_degrees: [f32; 3],
    /// Emit a bounding-box culling prologue at the start of each unit
    pub include_culling: bool,
    /// Name of the material describing the pipeline at rest
    pub default_material: String,
    /// Use this material for every mesh regardless of its own material
    pub force_material: Option<String>,
    /// Cost table used to estimate state transitions
    pub timing: TransitionTiming,
}

impl Default for DisplayListSettings {
    fn default() -> Self {
        Self {
            vertex_cache_size: MAX_VERTEX_CACHE_SIZE,
            has_tri2: true,
            max_matrix_depth: 10,
            can_pop_multiple_matrices: true,
            max_optimization_iterations: DEFAULT_MAX_OPTIMIZATION_ITERATIONS,
            fixed_point_scale: 256.0,
            model_scale: 1.0,
            model_rotation_degrees: [0.0, 0.0, 0.0],
            include_culling: false,
            default_material: "default".to_string(),
            force_material: None,
            timing: TransitionTiming::default(),
        }
    }
}

impl Config for DisplayListSettings {}

impl DisplayListSettings {
    /// Set the vertex cache size
    pub fn with_vertex_cache_size(mut self, size: usize) -> Self {
        self.vertex_cache_size = size;
        self
    }

    /// Enable or disable dual-triangle commands
    pub fn with_tri2(mut self, enabled: bool) -> Self {
        self.has_tri2 = enabled;
        self
    }

    /// Set the matrix stack depth limit
    pub fn with_max_matrix_depth(mut self, depth: usize) -> Self {
        self.max_matrix_depth = depth;
        self
    }

    /// Enable or disable multi-matrix pops
    pub fn with_multi_pop(mut self, enabled: bool) -> Self {
        self.can_pop_multiple_matrices = enabled;
        self
    }

    /// Set the order optimizer's iteration budget
    pub fn with_max_optimization_iterations(mut self, iterations: usize) -> Self {
        self.max_optimization_iterations = iterations;
        self
    }

    /// Set the default material name
    pub fn with_default_material(mut self, name: impl Into<String>) -> Self {
        self.default_material = name.into();
        self
    }

    /// Force every mesh to use one material
    pub fn with_force_material(mut self, name: impl Into<String>) -> Self {
        self.force_material = Some(name.into());
        self
    }

    /// Enable or disable the culling prologue
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.include_culling = enabled;
        self
    }

    /// Global rotation applied to exported geometry
    pub fn model_rotation(&self) -> Quat {
        utils::rotation_from_euler_degrees(self.model_rotation_degrees)
    }

    /// Transform from model space to fixed-point vertex space for unskinned geometry
    pub fn global_transform(&self) -> Mat4 {
        utils::rotate_then_scale(&self.model_rotation(), self.fixed_point_scale * self.model_scale)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(3..=MAX_VERTEX_CACHE_SIZE).contains(&self.vertex_cache_size) {
            return Err(ConfigError::Invalid {
                field: "vertex_cache_size",
                reason: format!(
                    "must hold at least one triangle and at most {MAX_VERTEX_CACHE_SIZE} vertices, got {}",
                    self.vertex_cache_size
                ),
            });
        }

        if self.max_matrix_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_matrix_depth",
                reason: "must be at least 1".to_string(),
            });
        }

        for (field, value) in [
            ("fixed_point_scale", self.fixed_point_scale),
            ("model_scale", self.model_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive finite number, got {value}"),
                });
            }
        }

        Ok(())
    }
}
