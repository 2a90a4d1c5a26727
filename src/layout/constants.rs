//! Constants for the layout engines.

/// Half-extent of the cubical view volume covered by the density field.
/// Positions are free to leave it; density splats clamp to the boundary.
pub const VIEW_HALF_EXTENT: f32 = 60.0;

/// Default density grid resolution (voxels per axis).
pub const DEFAULT_DENSITY_RES: usize = 48;

/// Ceiling on density grid cells (256³); larger grids fail to initialize.
pub const MAX_DENSITY_CELLS: usize = 16_777_216;

/// Splat kernel radius in voxels around a vertex's cell.
pub const SPLAT_RADIUS: i32 = 2;

/// Simulation parameters for one annealing stage of the density-field engine.
pub struct StageParams {
    pub name: &'static str,
    /// Micro-steps spent in this stage.
    pub iterations: u32,
    /// Uniform jitter amplitude for the randomized candidate.
    pub temperature: f32,
    /// Attraction coefficient; enters the energy as its fourth power.
    pub attraction: f32,
    /// Blend factor toward the current position (1.0 = frozen).
    pub damping: f32,
    /// Square the squared distance in the edge energy (quartic springs).
    pub quartic: bool,
}

/// The five-stage annealing schedule: hot and heavily damped early, cold and
/// mobile late. The first two stages use quartic springs to strongly resist
/// long edges while the layout is still tangled.
pub const STAGES: [StageParams; 5] = [
    StageParams {
        name: "Liquid",
        iterations: 40,
        temperature: 8.0,
        attraction: 1.0,
        damping: 0.85,
        quartic: true,
    },
    StageParams {
        name: "Expansion",
        iterations: 40,
        temperature: 5.0,
        attraction: 0.9,
        damping: 0.7,
        quartic: true,
    },
    StageParams {
        name: "Cooldown",
        iterations: 30,
        temperature: 2.5,
        attraction: 0.8,
        damping: 0.5,
        quartic: false,
    },
    StageParams {
        name: "Crunch",
        iterations: 30,
        temperature: 1.0,
        attraction: 0.8,
        damping: 0.3,
        quartic: false,
    },
    StageParams {
        name: "Simmer",
        iterations: 20,
        temperature: 0.25,
        attraction: 0.7,
        damping: 0.15,
        quartic: false,
    },
];

/// Starting value of the advisory edge-cut length threshold.
pub const CUT_LENGTH_INITIAL: f32 = VIEW_HALF_EXTENT;

/// Geometric shrink applied to the cut length at each stage transition.
pub const CUT_LENGTH_SHRINK: f32 = 0.5;

/// Advisory minimum-edges-to-keep schedule per stage: tightens through the
/// middle stages, fully relaxes in the final stage.
pub const MIN_KEEP_SCHEDULE: [u32; 5] = [2, 3, 4, 5, 0];

/// Sphere radius of the innermost shell.
pub const SHELL_BASE_RADIUS: f32 = 10.0;

/// Radial spacing between consecutive shells.
pub const SHELL_LAYER_SPACING: f32 = 6.0;

/// Same-shell edges with Jaccard neighbor similarity below this are cut.
pub const JACCARD_CUT_THRESHOLD: f32 = 0.05;

/// A swap is accepted when its energy delta is below the negative of this.
pub const SWAP_EPSILON: f32 = 1e-3;

/// Hilbert curve order for placement-point reordering (1024×1024 grid).
pub const HILBERT_ORDER: u32 = 10;

/// Safety valve: intra-shell passes before the phase is forced forward.
/// Local search is not guaranteed to converge on adversarial inputs; capping
/// it is a deliberate approximation.
pub const MAX_INTRA_PASSES: u32 = 512;

/// Safety valve: inter-shell passes before the engine is forced to Done.
pub const MAX_INTER_PASSES: u32 = 512;

/// Slack added to the overlap-resolver cell size.
pub const OVERLAP_CELL_EPSILON: f32 = 1e-3;

/// Cell-count ceiling for the overlap resolver's uniform grid.
pub const MAX_OVERLAP_CELLS: usize = 1_000_000;
