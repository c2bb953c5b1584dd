//! Render batches: extraction from meshes and draw order optimization

mod extract;
pub mod order;
mod render_batch;

pub use extract::{extract_batches, prepare_meshes};
pub use order::{batch_transition_cost, order_batches, solve, CostMatrix, TourSolution};
pub use render_batch::RenderBatch;
