//! Batch order optimization
//!
//! Ordering batches is an asymmetric travelling salesman problem: the tour
//! starts at the pipeline's rest state, visits every batch once and returns to
//! rest. A greedy nearest-neighbour tour gives the first bound; a best-first
//! branch and bound then improves on it until the queue is exhausted or the
//! iteration budget runs out.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::render_batch::RenderBatch;
use crate::foundation::collections::MaterialKey;
use crate::material::{transition_cost, TransitionTiming};
use crate::pipeline::traversal_counts;
use crate::scene::Scene;

/// Dense directed cost matrix; node 0 is the rest state
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    costs: Vec<f64>,
}

impl CostMatrix {
    /// Matrix of `size` nodes with every cost zero
    pub fn new(size: usize) -> Self {
        Self {
            size,
            costs: vec![0.0; size * size],
        }
    }

    /// Build a matrix from a cost function
    pub fn from_fn(size: usize, mut cost: impl FnMut(usize, usize) -> f64) -> Self {
        let mut matrix = Self::new(size);
        for from in 0..size {
            for to in 0..size {
                if from != to {
                    matrix.set(from, to, cost(from, to));
                }
            }
        }
        matrix
    }

    /// Number of nodes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cost of the edge `from -> to`
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.costs[from * self.size + to]
    }

    /// Set the cost of the edge `from -> to`
    pub fn set(&mut self, from: usize, to: usize, cost: f64) {
        self.costs[from * self.size + to] = cost;
    }

    /// Cost of the closed tour visiting `order` after node 0
    pub fn tour_cost(&self, order: &[usize]) -> f64 {
        let mut current = 0;
        let mut total = 0.0;
        for &next in order {
            total += self.get(current, next);
            current = next;
        }
        total + self.get(current, 0)
    }

    /// Cheapest and most expensive edge entering each node
    fn incoming_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        (0..self.size)
            .map(|to| {
                (0..self.size)
                    .filter(|&from| from != to)
                    .map(|from| self.get(from, to))
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), cost| {
                        (min.min(cost), max.max(cost))
                    })
            })
            .map(|(min, max)| if min.is_finite() { (min, max) } else { (0.0, 0.0) })
            .unzip()
    }
}

/// Result of the order search
#[derive(Debug, Clone, PartialEq)]
pub struct TourSolution {
    /// Visit order of the nodes after node 0
    pub order: Vec<usize>,
    /// Cost of the closed tour
    pub cost: f64,
    /// Cost of the greedy tour the search started from
    pub greedy_cost: f64,
    /// Partial tours expanded
    pub iterations: usize,
    /// Whether the search stopped on the iteration budget
    pub budget_exhausted: bool,
}

/// A partial tour in the search queue
///
/// `best_case` and `worst_case` bound the cost of any completion using the
/// cheapest and most expensive edge into every node not entered yet.
#[derive(Debug, Clone)]
struct PartialTour {
    path: Vec<usize>,
    visited: Vec<bool>,
    length: f64,
    best_case: f64,
    worst_case: f64,
}

impl PartialTour {
    fn current(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }

    fn extend(&self, matrix: &CostMatrix, next: usize, min_in: &[f64], max_in: &[f64]) -> PartialTour {
        let edge = matrix.get(self.current(), next);
        let mut path = self.path.clone();
        path.push(next);
        let mut visited = self.visited.clone();
        visited[next] = true;

        PartialTour {
            path,
            visited,
            length: self.length + edge,
            best_case: self.best_case - min_in[next] + edge,
            worst_case: self.worst_case - max_in[next] + edge,
        }
    }
}

impl PartialEq for PartialTour {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PartialTour {}

impl PartialOrd for PartialTour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartialTour {
    /// Reversed so the max-heap pops the lowest bound first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .best_case
            .total_cmp(&self.best_case)
            .then_with(|| other.worst_case.total_cmp(&self.worst_case))
    }
}

/// Nearest-neighbour tour from node 0, returning to node 0 last
pub fn greedy_tour(matrix: &CostMatrix) -> Vec<usize> {
    let mut visited = vec![false; matrix.size()];
    let mut order = Vec::with_capacity(matrix.size().saturating_sub(1));
    let mut current = 0;

    for _ in 1..matrix.size() {
        let next = (1..matrix.size())
            .filter(|&node| !visited[node])
            .min_by(|&a, &b| matrix.get(current, a).total_cmp(&matrix.get(current, b)));

        let Some(next) = next else {
            break;
        };

        visited[next] = true;
        order.push(next);
        current = next;
    }

    order
}

/// Find a low-cost closed tour through every node, starting at node 0
pub fn solve(matrix: &CostMatrix, max_iterations: usize) -> TourSolution {
    let greedy = greedy_tour(matrix);
    let greedy_cost = matrix.tour_cost(&greedy);

    let mut best = TourSolution {
        order: greedy,
        cost: greedy_cost,
        greedy_cost,
        iterations: 0,
        budget_exhausted: false,
    };

    let size = matrix.size();
    if size <= 2 {
        return best;
    }

    let (min_in, max_in) = matrix.incoming_bounds();
    let mut visited = vec![false; size];
    visited[0] = true;

    let mut queue = BinaryHeap::new();
    queue.push(PartialTour {
        path: Vec::with_capacity(size),
        visited,
        length: 0.0,
        best_case: min_in.iter().sum(),
        worst_case: max_in.iter().sum(),
    });

    while let Some(tour) = queue.pop() {
        if tour.best_case >= best.cost {
            break;
        }

        if best.iterations >= max_iterations {
            best.budget_exhausted = true;
            break;
        }
        best.iterations += 1;

        for next in (1..size).filter(|&node| !tour.visited[node]) {
            let child = tour.extend(matrix, next, &min_in, &max_in);

            if child.path.len() == size - 1 {
                let cost = child.length + matrix.get(next, 0);
                if cost < best.cost {
                    best.cost = cost;
                    best.order.clone_from(&child.path);
                }
            } else if child.best_case < best.cost {
                queue.push(child);
            }
        }
    }

    if best.budget_exhausted {
        log::info!(
            "Order search stopped after {} iterations: cost {:.1} vs greedy {:.1}",
            best.iterations,
            best.cost,
            best.greedy_cost
        );
    } else {
        log::debug!(
            "Order search finished after {} iterations: cost {:.1} vs greedy {:.1}",
            best.iterations,
            best.cost,
            best.greedy_cost
        );
    }

    best
}

/// Estimated cost of drawing `to` right after `from`
pub fn batch_transition_cost(scene: &Scene, timing: &TransitionTiming, from: &RenderBatch, to: &RenderBatch) -> f64 {
    let material = match (from.material, to.material) {
        (Some(from), Some(to)) => match (scene.materials.get(from), scene.materials.get(to)) {
            (Some(from), Some(to)) => transition_cost(&from.state, &to.state, timing),
            _ => 0.0,
        },
        _ => 0.0,
    };

    let (pops, pushes) = traversal_counts(&scene.hierarchy, from.bone_pair.1, to.bone_pair.0);

    material + timing.matrix_cost(pops, pushes)
}

/// Reorder batches to minimise the estimated transition cost
///
/// A batch at rest (no bones, default material) anchors the tour and is drawn
/// first; without one a synthetic anchor is used and dropped from the result.
pub fn order_batches(
    scene: &Scene,
    batches: Vec<RenderBatch>,
    default_material: Option<MaterialKey>,
    timing: &TransitionTiming,
    max_iterations: usize,
) -> Vec<RenderBatch> {
    if batches.len() <= 1 {
        return batches;
    }

    let mut nodes = batches;
    let anchored = match nodes.iter().position(|batch| batch.is_rest_state(default_material)) {
        Some(index) => {
            nodes.swap(0, index);
            true
        }
        None => {
            nodes.insert(0, RenderBatch::sentinel(default_material));
            false
        }
    };

    let matrix = CostMatrix::from_fn(nodes.len(), |from, to| {
        batch_transition_cost(scene, timing, &nodes[from], &nodes[to])
    });
    let solution = solve(&matrix, max_iterations);

    let mut ordered = Vec::with_capacity(nodes.len());
    if anchored {
        ordered.push(nodes[0]);
    }
    ordered.extend(solution.order.iter().map(|&node| nodes[node]));
    ordered
}
