//! Scenario tests that drive the whole compiler

mod end_to_end;
mod matrix_reuse;
mod texture_memory;
