//! Graph topology snapshot and structural metrics.
//!
//! The layout engines never own graph storage: they read an immutable
//! [`Topology`] for the duration of one layout run and mutate only their
//! position buffer. Topology changes mean building a new snapshot and
//! resetting the session.

mod metrics;
pub mod synth;
mod topology;

pub use metrics::Metrics;
pub use topology::Topology;
