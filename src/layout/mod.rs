//! Incremental 3D layout engines and the host-facing session.
//!
//! Two engines share one contract: the host calls [`LayoutEngine::step`] once
//! or more per frame, the engine advances its phase machine by that many
//! micro-steps mutating its position buffer, and the host copies positions
//! out between steps.
//!
//! - [`DensityLayout`] - five-stage annealing over a voxel density field.
//! - [`ShellLayout`] - concentric-shell partition with local-search swaps.
//! - [`resolve_overlaps`] - standalone spatial-hash de-overlap pass.

pub mod constants;
mod density;
mod field;
mod overlap;
mod shells;

use std::sync::Arc;

use glam::Vec3;
use thiserror::Error;

use crate::graph::Topology;

pub use density::DensityLayout;
pub use field::DensityField;
pub use overlap::resolve_overlaps;
pub use shells::{assign_shells, shell_pairs_for_pass, ShellLayout};

/// Initialization failures. Numeric edge cases inside a running engine are
/// clamped or defaulted locally and never surface as errors.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("density grid resolution must be nonzero")]
    ZeroResolution,
    #[error("density grid resolution {res} exceeds the {max}-cell ceiling")]
    GridTooLarge { res: usize, max: usize },
}

/// One engine's host-facing contract.
///
/// `step` blocks until the requested micro-steps are applied and returns true
/// while further work remains. The host must not read `positions` while a
/// step is in flight (single-writer discipline; there is no internal locking
/// against concurrent readers).
pub trait LayoutEngine: Send {
    fn step(&mut self, iterations: u32) -> bool;
    fn stage_name(&self) -> String;
    fn positions(&self) -> &[Vec3];
    fn positions_mut(&mut self) -> &mut [Vec3];
}

/// Which engine a session drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    DensityField,
    SpherePartition,
}

/// Host-facing control object owning exactly one active engine.
///
/// Topology changes and algorithm switches go through [`LayoutSession::reset`],
/// which drops the engine and all its buffers and builds a fresh one.
pub struct LayoutSession {
    topology: Arc<Topology>,
    kind: LayoutKind,
    engine: Box<dyn LayoutEngine>,
    steps_taken: u64,
}

impl LayoutSession {
    pub fn new(topology: Arc<Topology>, kind: LayoutKind, seed: u64) -> Result<Self, LayoutError> {
        Self::with_grid_res(topology, kind, seed, None)
    }

    /// Like [`Self::new`] with an explicit density grid resolution override
    /// (ignored by the sphere-partition engine).
    pub fn with_grid_res(
        topology: Arc<Topology>,
        kind: LayoutKind,
        seed: u64,
        grid_res: Option<usize>,
    ) -> Result<Self, LayoutError> {
        let engine = build_engine(&topology, kind, seed, grid_res)?;
        Ok(Self {
            topology,
            kind,
            engine,
            steps_taken: 0,
        })
    }

    /// Advance the active engine. Returns true while work remains.
    pub fn step(&mut self, iterations: u32) -> bool {
        self.steps_taken += u64::from(iterations);
        self.engine.step(iterations)
    }

    /// Human-readable phase/stage description for progress display.
    pub fn stage_name(&self) -> String {
        self.engine.stage_name()
    }

    pub fn positions(&self) -> &[Vec3] {
        self.engine.positions()
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Discard the active engine and start over with `kind`.
    pub fn reset(&mut self, kind: LayoutKind, seed: u64) -> Result<(), LayoutError> {
        self.engine = build_engine(&self.topology, kind, seed, None)?;
        self.kind = kind;
        self.steps_taken = 0;
        Ok(())
    }

    /// Run one de-overlap pass over the current positions using the
    /// topology's per-vertex radii.
    pub fn resolve_overlaps(&mut self, scale: f32) {
        let radii: Vec<f32> = self.topology.radii().to_vec();
        resolve_overlaps(self.engine.positions_mut(), &radii, scale);
    }
}

fn build_engine(
    topology: &Arc<Topology>,
    kind: LayoutKind,
    seed: u64,
    grid_res: Option<usize>,
) -> Result<Box<dyn LayoutEngine>, LayoutError> {
    Ok(match kind {
        LayoutKind::DensityField => match grid_res {
            Some(res) => Box::new(DensityLayout::with_grid_res(Arc::clone(topology), seed, res)?),
            None => Box::new(DensityLayout::new(Arc::clone(topology), seed)?),
        },
        LayoutKind::SpherePartition => Box::new(ShellLayout::new(Arc::clone(topology))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_switch_resets_progress() {
        let topo = Arc::new(Topology::from_edges(6, &[(0, 1), (1, 2), (3, 4), (4, 5)]));
        let mut session = LayoutSession::new(topo, LayoutKind::SpherePartition, 1).unwrap();
        session.step(2);
        assert!(session.steps_taken() >= 2);
        session.reset(LayoutKind::DensityField, 1).unwrap();
        assert_eq!(session.kind(), LayoutKind::DensityField);
        assert_eq!(session.steps_taken(), 0);
        assert!(session.stage_name().starts_with("Liquid"));
    }

    #[test]
    fn test_session_grid_res_failure_surfaces() {
        let topo = Arc::new(Topology::from_edges(2, &[(0, 1)]));
        let result = LayoutSession::with_grid_res(topo, LayoutKind::DensityField, 0, Some(4096));
        assert!(result.is_err());
    }

    #[test]
    fn test_session_resolve_overlaps() {
        let topo = Arc::new(Topology::from_edges(4, &[(0, 1), (1, 2), (2, 3)]));
        let mut session = LayoutSession::new(topo, LayoutKind::SpherePartition, 7).unwrap();
        while session.step(1) {}
        session.resolve_overlaps(1.0);
        let positions = session.positions();
        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                let min_dist = session.topology().radius(i) + session.topology().radius(j);
                assert!(positions[i].distance(positions[j]) >= min_dist - 1e-3);
            }
        }
    }
}
