//! Stage-based force layout: density-field repulsion, neighbor-centroid
//! attraction, simulated-annealing cooling over five stages.
//!
//! Each micro-step proposes two candidate positions per vertex (the damped
//! neighbor centroid and a temperature-jittered variant) and keeps whichever
//! has lower energy. Repulsion comes from sampling the shared voxel density
//! field rather than from pairwise forces, which keeps a micro-step linear in
//! vertex count.

use std::sync::Arc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::geometry::random_cube_points_with_rng;
use crate::graph::Topology;

use super::constants::{
    CUT_LENGTH_INITIAL, CUT_LENGTH_SHRINK, DEFAULT_DENSITY_RES, MIN_KEEP_SCHEDULE, STAGES,
    VIEW_HALF_EXTENT,
};
use super::field::DensityField;
use super::{LayoutEngine, LayoutError};

/// Five-stage annealing layout over a voxel density field.
pub struct DensityLayout {
    topo: Arc<Topology>,
    positions: Vec<Vec3>,
    /// Next-step buffer; parallel workers write disjoint slots here, then the
    /// buffers are swapped so step N+1 sees step N fully applied.
    scratch: Vec<Vec3>,
    field: DensityField,
    seed: u64,
    /// Index into [`STAGES`]; `STAGES.len()` once the run is complete.
    stage: usize,
    stage_iteration: u32,
    total_iterations: u64,
    /// Advisory edge-cut length threshold; shrinks geometrically per stage.
    /// Metadata for display only, never gates the energy formula.
    cut_length: f32,
    /// Advisory minimum-edges-to-keep threshold, same caveat.
    min_keep: u32,
}

impl DensityLayout {
    /// Create an engine with the default grid resolution, scattering initial
    /// positions uniformly inside the view volume.
    pub fn new(topo: Arc<Topology>, seed: u64) -> Result<Self, LayoutError> {
        Self::with_grid_res(topo, seed, DEFAULT_DENSITY_RES)
    }

    /// Create an engine with an explicit density grid resolution.
    pub fn with_grid_res(
        topo: Arc<Topology>,
        seed: u64,
        grid_res: usize,
    ) -> Result<Self, LayoutError> {
        let n = topo.num_vertices();
        let field = DensityField::new(grid_res, VIEW_HALF_EXTENT)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let positions = random_cube_points_with_rng(n, VIEW_HALF_EXTENT * 0.5, &mut rng);
        for &p in &positions {
            field.splat(p);
        }

        Ok(Self {
            scratch: positions.clone(),
            positions,
            field,
            seed,
            // Nothing to lay out: start in the terminal state.
            stage: if n == 0 { STAGES.len() } else { 0 },
            topo,
            stage_iteration: 0,
            total_iterations: 0,
            cut_length: CUT_LENGTH_INITIAL,
            min_keep: MIN_KEEP_SCHEDULE[0],
        })
    }

    /// Current advisory (cut_length, min_keep) stage metadata.
    pub fn cut_metadata(&self) -> (f32, u32) {
        (self.cut_length, self.min_keep)
    }

    /// Where attraction alone would move `v`: the weighted centroid of its
    /// neighbors' current positions (the vertex's own position when it has
    /// no neighbors). The micro-step blends this with the current position
    /// by the stage's damping factor.
    pub fn attraction_target(&self, v: usize) -> Vec3 {
        attraction_target(&self.topo, &self.positions, v)
    }

    pub fn current_stage(&self) -> Option<&'static str> {
        STAGES.get(self.stage).map(|s| s.name)
    }

    fn micro_step(&mut self) {
        let topo = &*self.topo;
        let field = &self.field;
        let positions = &self.positions;
        let params = &STAGES[self.stage];
        let a4 = params.attraction * params.attraction * params.attraction * params.attraction;
        let temperature = params.temperature;
        let damping = params.damping;
        let quartic = params.quartic;
        let step_seed = self
            .seed
            .wrapping_add(self.total_iterations.wrapping_mul(0x9e37_79b9_7f4a_7c15));

        self.scratch
            .par_iter_mut()
            .enumerate()
            .for_each(|(v, out)| {
                let current = positions[v];
                let nbrs = topo.neighbors(v);
                let weights = topo.neighbor_weights(v);

                // The vertex's own splat comes out before either candidate is
                // scored, so it never repels itself. This also keeps exact
                // ties honest: an isolated vertex over an empty field scores
                // zero for both candidates and stays put.
                field.unsplat(current);

                // Analytic candidate: damped pull toward the weighted
                // neighbor centroid. No pull leaves the position bit-exact
                // rather than round-tripping through the blend.
                let target = attraction_target(topo, positions, v);
                let analytic = if target == current {
                    current
                } else {
                    current * damping + target * (1.0 - damping)
                };

                let mut rng = ChaCha8Rng::seed_from_u64(
                    step_seed ^ (v as u64).wrapping_mul(0xd1b5_4a32_d192_ed03),
                );
                let jittered = analytic
                    + Vec3::new(
                        rng.gen_range(-temperature..=temperature),
                        rng.gen_range(-temperature..=temperature),
                        rng.gen_range(-temperature..=temperature),
                    );

                let energy = |p: Vec3| -> f32 {
                    let mut e = 0.0f32;
                    for (&nb, &w) in nbrs.iter().zip(weights) {
                        let d2 = p.distance_squared(positions[nb as usize]);
                        e += w * a4 * if quartic { d2 * d2 } else { d2 };
                    }
                    e + field.sample(p)
                };

                // Ties break toward the analytic candidate.
                let accepted = if energy(jittered) < energy(analytic) {
                    jittered
                } else {
                    analytic
                };

                field.splat(accepted);
                *out = accepted;
            });

        std::mem::swap(&mut self.positions, &mut self.scratch);
    }

    fn advance_stage(&mut self) {
        self.stage += 1;
        self.stage_iteration = 0;
        self.cut_length *= CUT_LENGTH_SHRINK;
        if let Some(&min_keep) = MIN_KEEP_SCHEDULE.get(self.stage) {
            self.min_keep = min_keep;
        }
        match STAGES.get(self.stage) {
            Some(next) => log::debug!(
                "density stage -> {} (cut_length {:.2}, min_keep {})",
                next.name,
                self.cut_length,
                self.min_keep
            ),
            None => log::info!(
                "density-field layout complete after {} iterations",
                self.total_iterations
            ),
        }
    }
}

/// Weighted centroid of `v`'s neighbors; `v`'s own position when it has no
/// neighbors (or only zero-weight edges).
fn attraction_target(topo: &Topology, positions: &[Vec3], v: usize) -> Vec3 {
    let nbrs = topo.neighbors(v);
    if nbrs.is_empty() {
        return positions[v];
    }
    let mut sum = Vec3::ZERO;
    let mut total_w = 0.0f32;
    for (&nb, &w) in nbrs.iter().zip(topo.neighbor_weights(v)) {
        sum += positions[nb as usize] * w;
        total_w += w;
    }
    if total_w > 0.0 {
        sum / total_w
    } else {
        positions[v]
    }
}

impl LayoutEngine for DensityLayout {
    fn step(&mut self, iterations: u32) -> bool {
        for _ in 0..iterations {
            if self.stage >= STAGES.len() {
                return false;
            }
            self.micro_step();
            self.total_iterations += 1;
            self.stage_iteration += 1;
            if self.stage_iteration >= STAGES[self.stage].iterations {
                self.advance_stage();
            }
        }
        self.stage < STAGES.len()
    }

    fn stage_name(&self) -> String {
        match STAGES.get(self.stage) {
            Some(params) => format!(
                "{}: {}/{}",
                params.name, self.stage_iteration, params.iterations
            ),
            None => "Done".to_string(),
        }
    }

    fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> Arc<Topology> {
        Arc::new(Topology::from_edges(4, &[(0, 1), (1, 2), (2, 3)]))
    }

    #[test]
    fn test_stage_names_progress() {
        let mut engine = DensityLayout::new(path4(), 11).unwrap();
        assert!(engine.stage_name().starts_with("Liquid"));
        let budget: u32 = STAGES.iter().map(|s| s.iterations).sum();
        assert!(engine.step(budget - 1));
        assert!(engine.stage_name().starts_with("Simmer"));
        assert!(!engine.step(1));
        assert_eq!(engine.stage_name(), "Done");
    }

    #[test]
    fn test_cut_metadata_schedule() {
        let mut engine = DensityLayout::new(path4(), 3).unwrap();
        let (len0, keep0) = engine.cut_metadata();
        assert_eq!(len0, CUT_LENGTH_INITIAL);
        assert_eq!(keep0, MIN_KEEP_SCHEDULE[0]);
        engine.step(STAGES[0].iterations);
        let (len1, keep1) = engine.cut_metadata();
        assert!((len1 - CUT_LENGTH_INITIAL * CUT_LENGTH_SHRINK).abs() < 1e-6);
        assert_eq!(keep1, MIN_KEEP_SCHEDULE[1]);
        // Final stage fully relaxes the keep threshold.
        let budget: u32 = STAGES.iter().map(|s| s.iterations).sum();
        engine.step(budget);
        assert_eq!(engine.cut_metadata().1, 0);
    }

    #[test]
    fn test_isolated_vertex_holds_position_over_full_run() {
        // One vertex, no edges: the analytic candidate equals the current
        // position and, with the vertex's own splat removed before scoring,
        // both candidates see an empty field. Exact tie every step, so the
        // vertex never moves.
        let topo = Arc::new(Topology::from_edges(1, &[]));
        let mut engine = DensityLayout::new(topo, 5).unwrap();
        let before = engine.positions()[0];
        let budget: u32 = STAGES.iter().map(|s| s.iterations).sum();
        assert!(!engine.step(budget));
        assert_eq!(engine.positions()[0], before);
    }

    #[test]
    fn test_zero_vertices() {
        let topo = Arc::new(Topology::from_edges(0, &[]));
        let mut engine = DensityLayout::new(topo, 0).unwrap();
        assert!(!engine.step(3));
        assert_eq!(engine.stage_name(), "Done");
        assert!(engine.positions().is_empty());
    }

    #[test]
    fn test_grid_res_override_and_failure() {
        let res = DensityLayout::with_grid_res(path4(), 0, 32).unwrap();
        assert_eq!(res.field.resolution(), 32);
        assert!(DensityLayout::with_grid_res(path4(), 0, 0).is_err());
    }

    #[test]
    fn test_initial_scatter_reproducible_for_fixed_seed() {
        // Steps race on density sampling by design, but the seeded initial
        // scatter must be identical.
        let a = DensityLayout::new(path4(), 99).unwrap();
        let b = DensityLayout::new(path4(), 99).unwrap();
        assert_eq!(a.positions(), b.positions());
    }
}
