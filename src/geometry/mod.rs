//! Shared geometry: sphere point distributions and the Hilbert curve index
//! used to order placement points by spatial locality.

mod hilbert;
mod sphere;

pub use hilbert::hilbert_index;
pub use sphere::{fibonacci_sphere_points, random_cube_points_with_rng, sphere_angles};
