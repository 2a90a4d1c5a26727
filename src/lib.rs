//! Incremental 3D graph layout.
//!
//! Computes spatial positions for graph vertices under a real-time,
//! frame-by-frame budget: the host calls `step` once per frame, the active
//! engine advances its internal stage machine, and the shared position buffer
//! fills in incrementally.
//!
//! **Engines**
//! - Density-field layout - five-stage annealing simulation (Liquid,
//!   Expansion, Cooldown, Crunch, Simmer) with voxel-grid repulsion and
//!   neighbor-centroid attraction.
//! - Sphere-partition layout - composite-centrality shell assignment,
//!   Hilbert-packed Fibonacci-spiral placement, parallel pairwise-swap
//!   refinement within and between shells.
//!
//! **Utilities**
//! - Spatial-hash overlap resolver for one-shot de-overlap passes.
//! - Topology snapshot with coreness/betweenness/eccentricity/clustering
//!   metrics.

pub mod geometry;
pub mod graph;
pub mod layout;
pub mod util;
