//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the compiler:
//! - Math types and operations
//! - Handle types for materials and meshes
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
