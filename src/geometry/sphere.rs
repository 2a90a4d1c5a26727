//! Point distributions on and around the unit sphere.

use glam::Vec3;
use rand::Rng;

/// Golden angle in radians, the turn between consecutive spiral points.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Generate `n` points on a sphere of radius `radius` using a Fibonacci spiral.
///
/// Points are returned in spiral order: monotonically descending in z, with
/// consecutive points separated by the golden angle in azimuth. The
/// distribution is near-uniform for any `n >= 1`.
pub fn fibonacci_sphere_points(n: usize, radius: f32) -> Vec<Vec3> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![Vec3::new(0.0, 0.0, radius)];
    }
    (0..n)
        .map(|i| {
            // z descends from ~+1 to ~-1, offset by half a step to avoid poles
            let z = 1.0 - (2.0 * i as f32 + 1.0) / n as f32;
            let r = (1.0 - z * z).max(0.0).sqrt();
            let theta = GOLDEN_ANGLE * i as f32;
            Vec3::new(r * theta.cos(), r * theta.sin(), z) * radius
        })
        .collect()
}

/// Azimuth in [0, TAU) and polar angle in [0, PI] of a point (any radius).
///
/// Degenerate input (zero vector) maps to (0, 0).
pub fn sphere_angles(p: Vec3) -> (f32, f32) {
    let len = p.length();
    if len <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let mut azimuth = p.y.atan2(p.x);
    if azimuth < 0.0 {
        azimuth += std::f32::consts::TAU;
    }
    let polar = (p.z / len).clamp(-1.0, 1.0).acos();
    (azimuth, polar)
}

/// Generate `n` uniformly distributed points inside the axis-aligned cube
/// `[-half_extent, half_extent]³` using a provided RNG.
pub fn random_cube_points_with_rng<R: Rng>(n: usize, half_extent: f32, rng: &mut R) -> Vec<Vec3> {
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-half_extent..=half_extent),
                rng.gen_range(-half_extent..=half_extent),
                rng.gen_range(-half_extent..=half_extent),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_points_on_sphere() {
        let points = fibonacci_sphere_points(500, 3.0);
        assert_eq!(points.len(), 500);
        for p in &points {
            let len = p.length();
            assert!(
                (len - 3.0).abs() < 1e-4,
                "Point not on radius-3 sphere: length = {}",
                len
            );
        }
    }

    #[test]
    fn test_fibonacci_spread() {
        // No two consecutive spiral points should coincide.
        let points = fibonacci_sphere_points(64, 1.0);
        for w in points.windows(2) {
            assert!(w[0].distance(w[1]) > 1e-3);
        }
    }

    #[test]
    fn test_fibonacci_degenerate_counts() {
        assert!(fibonacci_sphere_points(0, 1.0).is_empty());
        let single = fibonacci_sphere_points(1, 2.0);
        assert_eq!(single.len(), 1);
        assert!((single[0].length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_angles_ranges() {
        for p in fibonacci_sphere_points(100, 1.0) {
            let (az, polar) = sphere_angles(p);
            assert!((0.0..std::f32::consts::TAU).contains(&az));
            assert!((0.0..=std::f32::consts::PI).contains(&polar));
        }
        assert_eq!(sphere_angles(Vec3::ZERO), (0.0, 0.0));
    }

    #[test]
    fn test_random_cube_points_in_bounds() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let points = random_cube_points_with_rng(200, 10.0, &mut rng);
        for p in points {
            assert!(p.abs().max_element() <= 10.0);
        }
    }
}
