//! Force-directed (Fruchterman-Reingold) layout.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::graph::NeighborhoodGraph;

/// 2D node positions, indexed by node insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<[f32; 2]>,
}

impl Layout {
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    pub fn position(&self, node: usize) -> Option<[f32; 2]> {
        self.positions.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Center on the origin and scale so the largest coordinate is 1.
    fn rescale(&mut self) {
        let n = self.positions.len() as f32;
        if n == 0.0 {
            return;
        }
        let mut center = [0.0f32; 2];
        for p in &self.positions {
            center[0] += p[0] / n;
            center[1] += p[1] / n;
        }
        let mut extent = 0.0f32;
        for p in &mut self.positions {
            p[0] -= center[0];
            p[1] -= center[1];
            extent = extent.max(p[0].abs()).max(p[1].abs());
        }
        if extent > 0.0 {
            for p in &mut self.positions {
                p[0] /= extent;
                p[1] /= extent;
            }
        }
    }
}

/// Compute a spring layout of `graph`.
///
/// Edges attract in proportion to their weight, all node pairs repel, and
/// the step size cools linearly over `iterations`. The result is centered
/// and scaled into `[-1, 1]`. The same seed always yields the same layout.
pub fn spring_layout(graph: &NeighborhoodGraph, iterations: usize, seed: u64) -> Layout {
    let n = graph.node_count();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions: Vec<[f32; 2]> = (0..n)
        .map(|_| [rng.random::<f32>(), rng.random::<f32>()])
        .collect();

    if n < 2 {
        let mut layout = Layout {
            positions: vec![[0.0, 0.0]; n],
        };
        layout.rescale();
        return layout;
    }

    // symmetric weighted adjacency as (neighbor, weight) lists
    let mut adjacency: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n];
    for edge in graph.edges() {
        if let (Some(a), Some(b)) = (
            graph.node_position(&edge.source),
            graph.node_position(&edge.target),
        ) {
            let w = edge.weight.max(0.0);
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }
    }

    let k = (1.0 / n as f32).sqrt();
    let mut temperature = 0.1f32;
    let cooling = temperature / (iterations as f32 + 1.0);

    for _ in 0..iterations {
        let current = &positions;
        let displacement: Vec<[f32; 2]> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut d = [0.0f32; 2];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let dx = current[i][0] - current[j][0];
                    let dy = current[i][1] - current[j][1];
                    let dist = (dx * dx + dy * dy).sqrt().max(0.01);
                    let repulse = k * k / (dist * dist);
                    d[0] += dx * repulse;
                    d[1] += dy * repulse;
                }
                for &(j, w) in &adjacency[i] {
                    let dx = current[i][0] - current[j][0];
                    let dy = current[i][1] - current[j][1];
                    let dist = (dx * dx + dy * dy).sqrt().max(0.01);
                    let attract = w * dist / k;
                    d[0] -= dx * attract;
                    d[1] -= dy * attract;
                }
                d
            })
            .collect();

        for (p, d) in positions.iter_mut().zip(&displacement) {
            let length = (d[0] * d[0] + d[1] * d[1]).sqrt().max(0.01);
            let scale = temperature / length;
            p[0] += d[0] * scale;
            p[1] += d[1] * scale;
        }
        temperature -= cooling;
    }

    let mut layout = Layout { positions };
    layout.rescale();
    layout
}
