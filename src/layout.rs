use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::coauthor_graph::CoauthorshipGraph;

const MIN_DISTANCE: f64 = 0.01;
const THRESHOLD: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub seed: u64,
    pub k: f64,
    pub iterations: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            seed: 42,
            k: 0.3,
            iterations: 50,
        }
    }
}

pub type Point = [f64; 2];

// Fruchterman-Reingold: pairs repel with k^2/d, edges attract with d^2/k.
// One position per node in `graph.nodes()` order, rescaled into [-1, 1].
pub fn spring_layout(graph: &CoauthorshipGraph, params: &LayoutParams) -> Vec<Point> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![[0.0, 0.0]];
    }

    let mut adjacent = vec![false; n * n];
    for e in graph.edges() {
        adjacent[e.source_ix * n + e.target_ix] = true;
        adjacent[e.target_ix * n + e.source_ix] = true;
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut pos: Vec<Point> = (0..n).map(|_| [rng.gen(), rng.gen()]).collect();

    let k = params.k;
    let mut t = extent(&pos) * 0.1;
    let dt = t / (params.iterations as f64 + 1.0);

    for _ in 0..params.iterations {
        let mut disp = vec![[0.0f64; 2]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i][0] - pos[j][0];
                let dy = pos[i][1] - pos[j][1];
                let d = dx.hypot(dy).max(MIN_DISTANCE);
                let pull = if adjacent[i * n + j] { d / k } else { 0.0 };
                let f = k * k / (d * d) - pull;
                disp[i][0] += dx * f;
                disp[i][1] += dy * f;
            }
        }

        let mut moved = 0.0;
        for (p, dv) in pos.iter_mut().zip(disp.iter()) {
            let len = dv[0].hypot(dv[1]).max(MIN_DISTANCE);
            let step = [dv[0] * t / len, dv[1] * t / len];
            p[0] += step[0];
            p[1] += step[1];
            moved += step[0] * step[0] + step[1] * step[1];
        }
        t -= dt;
        if moved.sqrt() / (n as f64) < THRESHOLD {
            break;
        }
    }

    rescale(&mut pos, 1.0);
    pos
}

fn extent(pos: &[Point]) -> f64 {
    let mut out: f64 = 0.0;
    for dim in 0..2 {
        let lo = pos.iter().map(|p| p[dim]).fold(f64::INFINITY, f64::min);
        let hi = pos.iter().map(|p| p[dim]).fold(f64::NEG_INFINITY, f64::max);
        out = out.max(hi - lo);
    }
    out
}

fn rescale(pos: &mut [Point], scale: f64) {
    let n = pos.len() as f64;
    let mut lim: f64 = 0.0;
    for dim in 0..2 {
        let mean = pos.iter().map(|p| p[dim]).sum::<f64>() / n;
        for p in pos.iter_mut() {
            p[dim] -= mean;
            lim = lim.max(p[dim].abs());
        }
    }
    if lim > 0.0 {
        for p in pos.iter_mut() {
            p[0] *= scale / lim;
            p[1] *= scale / lim;
        }
    }
}
