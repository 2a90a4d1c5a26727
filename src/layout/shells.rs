//! Layered sphere layout: composite-centrality shell assignment, Hilbert
//! packed Fibonacci-spiral placement, then parallel local-search swap
//! optimization within and between shells.
//!
//! Phases run `Init -> IntraShell -> InterShell -> Done`. Shell membership is
//! fixed after Init; the swap phases only exchange coordinates between
//! vertices, which is what makes the per-shell parallelism race-free.

use std::cmp::Reverse;
use std::sync::Arc;

use glam::Vec3;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::geometry::{fibonacci_sphere_points, hilbert_index, sphere_angles};
use crate::graph::{Metrics, Topology};
use crate::util::Timed;

use super::constants::{
    HILBERT_ORDER, JACCARD_CUT_THRESHOLD, MAX_INTER_PASSES, MAX_INTRA_PASSES, SHELL_BASE_RADIUS,
    SHELL_LAYER_SPACING, SWAP_EPSILON,
};
use super::LayoutEngine;

/// Phase state machine. Transitions are one-directional; InterShell loops on
/// itself with alternating parity until an even pass and the odd pass after
/// it both run quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    IntraShell { pass: u32 },
    InterShell { pass: u32, zero_streak: u32 },
    Done,
}

/// Shell pairs optimized on a given inter-shell pass: even passes take
/// (0,1), (2,3), ...; odd passes take (1,2), (3,4), ... No two pairs of one
/// pass share a shell, which is the whole correctness argument for running
/// them concurrently.
pub fn shell_pairs_for_pass(num_shells: usize, pass: u32) -> Vec<(usize, usize)> {
    let start = (pass % 2) as usize;
    (start..num_shells.saturating_sub(1))
        .step_by(2)
        .map(|s| (s, s + 1))
        .collect()
}

/// Concentric-shell layout engine.
pub struct ShellLayout {
    topo: Arc<Topology>,
    positions: Vec<Vec3>,
    phase: Phase,
    /// Shell index per vertex; valid once Init has run.
    shell: Vec<u32>,
    /// Members per shell, in descending composite-score order.
    shells: Vec<Vec<u32>>,
    /// Cut flag per canonical edge id (weak same-shell ties).
    cut: Vec<bool>,
    /// Accepted swap deltas of the most recent pass (diagnostics).
    last_swap_deltas: Vec<f32>,
}

impl ShellLayout {
    pub fn new(topo: Arc<Topology>) -> Self {
        let n = topo.num_vertices();
        Self {
            positions: vec![Vec3::ZERO; n],
            shell: Vec::new(),
            shells: Vec::new(),
            cut: Vec::new(),
            phase: Phase::Init,
            last_swap_deltas: Vec::new(),
            topo,
        }
    }

    pub fn num_shells(&self) -> usize {
        self.shells.len()
    }

    /// Shell index of `v`. Only meaningful after the Init phase has run.
    pub fn shell_of(&self, v: usize) -> u32 {
        self.shell[v]
    }

    pub fn shell_members(&self, s: usize) -> &[u32] {
        &self.shells[s]
    }

    pub fn is_cut(&self, edge: usize) -> bool {
        self.cut[edge]
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Accepted swap deltas from the most recent optimization pass. Every
    /// entry is below `-SWAP_EPSILON` by construction.
    pub fn last_swap_deltas(&self) -> &[f32] {
        &self.last_swap_deltas
    }

    // ---- Phase Init ----

    fn run_init(&mut self) {
        let _t = Timed::debug("Shell assignment");
        let n = self.topo.num_vertices();
        if n == 0 {
            self.phase = Phase::Done;
            return;
        }

        let k = (((n as f32).sqrt() * 0.5).round() as usize).max(3);
        let metrics = Metrics::compute(&self.topo);
        let scores = composite_scores(&metrics);

        // Descending composite score; shell 0 is the structural core.
        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_unstable_by_key(|&v| Reverse(OrderedFloat(scores[v as usize])));

        self.shell = assign_shells(&order, k);
        self.shells = vec![Vec::new(); k];
        for &v in &order {
            self.shells[self.shell[v as usize] as usize].push(v);
        }

        self.cut = self.compute_cut_edges();

        // Place each shell independently: disjoint vertex sets, no shared
        // writes.
        let topo = &self.topo;
        let shell_positions: Vec<Vec<(u32, Vec3)>> = self
            .shells
            .par_iter()
            .enumerate()
            .map(|(s, members)| place_shell(s, members, &metrics.clustering))
            .collect();
        for placed in shell_positions {
            for (v, p) in placed {
                self.positions[v as usize] = p;
            }
        }

        log::debug!(
            "shell init: {} vertices over {} shells, {} of {} edges cut",
            n,
            k,
            self.cut.iter().filter(|&&c| c).count(),
            topo.num_edges()
        );
        self.phase = Phase::IntraShell { pass: 0 };
    }

    /// Mark weak same-shell ties: both endpoints on one shell and Jaccard
    /// neighbor similarity under the threshold.
    fn compute_cut_edges(&self) -> Vec<bool> {
        let topo = &self.topo;
        let shell = &self.shell;
        (0..topo.num_edges())
            .into_par_iter()
            .map(|e| {
                let (u, v) = topo.edge(e);
                shell[u as usize] == shell[v as usize]
                    && jaccard(topo.neighbors(u as usize), topo.neighbors(v as usize))
                        < JACCARD_CUT_THRESHOLD
            })
            .collect()
    }

    // ---- Phase IntraShell ----

    /// One full pass over every shell's pair set. Returns into InterShell
    /// once a pass applies zero swaps.
    fn intra_pass(&mut self, pass: u32) {
        let topo = &self.topo;
        let shell = &self.shell;
        let cut = &self.cut;
        let positions = &self.positions;

        let results: Vec<(usize, Vec<Vec3>, Vec<f32>)> = self
            .shells
            .par_iter()
            .enumerate()
            .map(|(s, members)| {
                let mut local: Vec<Vec3> =
                    members.iter().map(|&v| positions[v as usize]).collect();
                let mut deltas = Vec::new();
                if members.len() < 2 {
                    return (s, local, deltas);
                }
                let slot: FxHashMap<u32, usize> =
                    members.iter().enumerate().map(|(j, &v)| (v, j)).collect();

                // Energy of vertex v at point p: non-cut edges to same-shell
                // neighbors, read from the worker-local buffer.
                let delta_for = |v: u32, from: Vec3, to: Vec3, skip: u32, local: &[Vec3]| {
                    let vi = v as usize;
                    let mut d = 0.0f32;
                    let edges = topo.neighbor_edges(vi);
                    for (i, &nb) in topo.neighbors(vi).iter().enumerate() {
                        if nb == skip
                            || shell[nb as usize] != s as u32
                            || cut[edges[i] as usize]
                        {
                            continue;
                        }
                        let np = local[slot[&nb]];
                        d += to.distance(np) - from.distance(np);
                    }
                    d
                };

                for a in 0..members.len() {
                    for b in a + 1..members.len() {
                        let (va, vb) = (members[a], members[b]);
                        let (pa, pb) = (local[a], local[b]);
                        // The a-b edge (if any) keeps its length under the
                        // swap, so each side skips the other.
                        let delta = delta_for(va, pa, pb, vb, &local)
                            + delta_for(vb, pb, pa, va, &local);
                        if delta < -SWAP_EPSILON {
                            local.swap(a, b);
                            deltas.push(delta);
                        }
                    }
                }
                (s, local, deltas)
            })
            .collect();

        let mut total_swaps = 0usize;
        self.last_swap_deltas.clear();
        for (s, local, deltas) in results {
            total_swaps += deltas.len();
            self.last_swap_deltas.extend(deltas);
            for (j, &v) in self.shells[s].iter().enumerate() {
                self.positions[v as usize] = local[j];
            }
        }

        if total_swaps == 0 {
            self.phase = Phase::InterShell {
                pass: 0,
                zero_streak: 0,
            };
        } else if pass + 1 >= MAX_INTRA_PASSES {
            log::warn!(
                "intra-shell optimization hit its {} pass cap, forcing transition",
                MAX_INTRA_PASSES
            );
            self.phase = Phase::InterShell {
                pass: 0,
                zero_streak: 0,
            };
        } else {
            log::trace!("intra-shell pass {}: {} swaps", pass, total_swaps);
            self.phase = Phase::IntraShell { pass: pass + 1 };
        }
    }

    // ---- Phase InterShell ----

    /// One checkerboard pass over shell pairs of the current parity. Swaps
    /// members of the lower shell using energy toward the upper shell, with
    /// cut edges reactivated so the boundary can relax.
    fn inter_pass(&mut self, pass: u32, zero_streak: u32) {
        let topo = &self.topo;
        let shell = &self.shell;
        let positions = &self.positions;
        let pairs = shell_pairs_for_pass(self.shells.len(), pass);

        let results: Vec<(usize, Vec<Vec3>, Vec<f32>)> = pairs
            .par_iter()
            .map(|&(s, target)| {
                let members = &self.shells[s];
                let mut local: Vec<Vec3> =
                    members.iter().map(|&v| positions[v as usize]).collect();
                let mut deltas = Vec::new();
                if members.len() < 2 {
                    return (s, local, deltas);
                }

                // Target-shell positions are stable this pass (parity rule),
                // so they can be read straight from the shared buffer.
                let delta_for = |v: u32, from: Vec3, to: Vec3| {
                    let mut d = 0.0f32;
                    for &nb in topo.neighbors(v as usize) {
                        if shell[nb as usize] != target as u32 {
                            continue;
                        }
                        let np = positions[nb as usize];
                        d += to.distance(np) - from.distance(np);
                    }
                    d
                };

                for a in 0..members.len() {
                    for b in a + 1..members.len() {
                        let (va, vb) = (members[a], members[b]);
                        let (pa, pb) = (local[a], local[b]);
                        let delta = delta_for(va, pa, pb) + delta_for(vb, pb, pa);
                        if delta < -SWAP_EPSILON {
                            local.swap(a, b);
                            deltas.push(delta);
                        }
                    }
                }
                (s, local, deltas)
            })
            .collect();

        let mut total_swaps = 0usize;
        self.last_swap_deltas.clear();
        for (s, local, deltas) in results {
            total_swaps += deltas.len();
            self.last_swap_deltas.extend(deltas);
            for (j, &v) in self.shells[s].iter().enumerate() {
                self.positions[v as usize] = local[j];
            }
        }

        let zero_streak = if total_swaps == 0 { zero_streak + 1 } else { 0 };
        // Converged only once both parities have run quiet back to back,
        // closing on an odd pass so the streak always spans an even/odd pair.
        if zero_streak >= 2 && pass % 2 == 1 {
            log::debug!("inter-shell optimization converged after {} passes", pass + 1);
            self.phase = Phase::Done;
        } else if pass + 1 >= MAX_INTER_PASSES {
            log::warn!(
                "inter-shell optimization hit its {} pass cap, forcing Done",
                MAX_INTER_PASSES
            );
            self.phase = Phase::Done;
        } else {
            log::trace!("inter-shell pass {}: {} swaps", pass, total_swaps);
            self.phase = Phase::InterShell {
                pass: pass + 1,
                zero_streak,
            };
        }
    }
}

impl LayoutEngine for ShellLayout {
    fn step(&mut self, iterations: u32) -> bool {
        for _ in 0..iterations {
            match self.phase {
                Phase::Init => self.run_init(),
                Phase::IntraShell { pass } => self.intra_pass(pass),
                Phase::InterShell { pass, zero_streak } => self.inter_pass(pass, zero_streak),
                Phase::Done => return false,
            }
        }
        self.phase != Phase::Done
    }

    fn stage_name(&self) -> String {
        match self.phase {
            Phase::Init => "Assigning shells".to_string(),
            Phase::IntraShell { pass } => format!("Intra-shell refinement: pass {}", pass),
            Phase::InterShell { pass, .. } => format!("Inter-shell refinement: pass {}", pass),
            Phase::Done => "Done".to_string(),
        }
    }

    fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }
}

/// Partition a descending-score vertex order into `k` contiguous equal-size
/// blocks of `ceil(len/k)`, overflow clamped to the last shell. Returns the
/// shell index per vertex.
pub fn assign_shells(order: &[u32], k: usize) -> Vec<u32> {
    assert!(k > 0);
    let block = order.len().div_ceil(k).max(1);
    let mut shell = vec![0u32; order.len()];
    for (rank, &v) in order.iter().enumerate() {
        shell[v as usize] = ((rank / block).min(k - 1)) as u32;
    }
    shell
}

/// Composite structural score: coreness + 0.5·betweenness − eccentricity,
/// each max-normalized to [0, 1]. Infinite eccentricity normalizes to 1.
fn composite_scores(metrics: &Metrics) -> Vec<f32> {
    let cn = normalized(&metrics.coreness);
    let bn = normalized(&metrics.betweenness);
    let en = normalized(&metrics.eccentricity);
    cn.iter()
        .zip(&bn)
        .zip(&en)
        .map(|((&c, &b), &e)| c + 0.5 * b - e)
        .collect()
}

/// Divide by the max finite value (an all-zero max counts as 1); infinities
/// map to 1.0.
fn normalized(values: &[f32]) -> Vec<f32> {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max);
    let max = if max > 0.0 { max } else { 1.0 };
    values
        .iter()
        .map(|&v| if v.is_finite() { v / max } else { 1.0 })
        .collect()
}

/// Jaccard similarity of two ascending neighbor lists.
fn jaccard(a: &[u32], b: &[u32]) -> f32 {
    let mut inter = 0usize;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                inter += 1;
                i += 1;
                j += 1;
            }
        }
    }
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f32 / union as f32
    }
}

/// Place one shell's members on its sphere.
///
/// Members sort by local clustering coefficient ascending (sparse
/// neighborhoods place first); spiral points re-sort by Hilbert index over
/// their quantized angles so spatially adjacent points get adjacent placement
/// order; point j then goes to member j.
fn place_shell(s: usize, members: &[u32], clustering: &[f32]) -> Vec<(u32, Vec3)> {
    if members.is_empty() {
        return Vec::new();
    }
    let mut by_density: Vec<u32> = members.to_vec();
    by_density.sort_unstable_by_key(|&v| OrderedFloat(clustering[v as usize]));

    let radius = SHELL_BASE_RADIUS + s as f32 * SHELL_LAYER_SPACING;
    let mut points = fibonacci_sphere_points(members.len(), radius);
    let cells = (1u32 << HILBERT_ORDER) - 1;
    points.sort_by_cached_key(|&p| {
        let (azimuth, polar) = sphere_angles(p);
        let x = ((azimuth / std::f32::consts::TAU) * cells as f32) as u32;
        let y = ((polar / std::f32::consts::PI) * cells as f32) as u32;
        hilbert_index(HILBERT_ORDER, x.min(cells), y.min(cells))
    });

    by_density.into_iter().zip(points).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_pairs_parity_disjoint() {
        for num_shells in 0..12 {
            for pass in 0..4 {
                let pairs = shell_pairs_for_pass(num_shells, pass);
                let mut seen = std::collections::HashSet::new();
                for (a, b) in &pairs {
                    assert_eq!(b - a, 1);
                    assert!(seen.insert(*a), "shell {} appears in two pairs", a);
                    assert!(seen.insert(*b), "shell {} appears in two pairs", b);
                }
            }
        }
        assert_eq!(shell_pairs_for_pass(5, 0), vec![(0, 1), (2, 3)]);
        assert_eq!(shell_pairs_for_pass(5, 1), vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_inter_shell_converges_on_odd_pass() {
        // Both parities have to run quiet before Done: a streak that reaches
        // two on an even pass keeps the phase alive until the following odd
        // pass is also quiet.
        let topo = Arc::new(Topology::from_edges(3, &[]));
        let mut engine = ShellLayout::new(topo);
        while !matches!(engine.phase, Phase::InterShell { .. }) {
            engine.step(1);
        }
        engine.phase = Phase::InterShell {
            pass: 2,
            zero_streak: 1,
        };
        assert!(engine.step(1));
        assert_eq!(
            engine.phase,
            Phase::InterShell {
                pass: 3,
                zero_streak: 2
            }
        );
        assert!(!engine.step(1));
        assert!(engine.is_done());
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&[], &[]), 0.0);
        assert_eq!(jaccard(&[1, 2, 3], &[1, 2, 3]), 1.0);
        assert!((jaccard(&[1, 2], &[2, 3]) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(jaccard(&[1], &[2]), 0.0);
    }

    #[test]
    fn test_normalized_handles_zero_and_infinity() {
        assert_eq!(normalized(&[0.0, 0.0]), vec![0.0, 0.0]);
        let n = normalized(&[2.0, f32::INFINITY, 1.0]);
        assert_eq!(n, vec![1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_place_shell_assigns_all_members() {
        let clustering = vec![0.5, 0.1, 0.9, 0.0];
        let placed = place_shell(1, &[0, 1, 2, 3], &clustering);
        assert_eq!(placed.len(), 4);
        let expected_radius = SHELL_BASE_RADIUS + SHELL_LAYER_SPACING;
        for (_, p) in &placed {
            assert!((p.length() - expected_radius).abs() < 1e-3);
        }
        // Lowest clustering coefficient places first.
        assert_eq!(placed[0].0, 3);
        assert!(place_shell(0, &[], &clustering).is_empty());
    }
}
