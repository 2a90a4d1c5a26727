//! Voxel density field used as the repulsion term of the density-field
//! engine.
//!
//! The field is an engine-owned cube of f32 cells stored as `AtomicU32` bit
//! patterns so that concurrent per-vertex workers can splat and unsplat
//! overlapping kernel neighborhoods without locks. At any quiescent point
//! every vertex has exactly one splat in the field.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

use super::constants::{MAX_DENSITY_CELLS, SPLAT_RADIUS};
use super::LayoutError;

/// Fixed-resolution 3D scalar density grid over a cubical volume.
pub struct DensityField {
    res: usize,
    half_extent: f32,
    /// World units per voxel.
    cell_size: f32,
    /// f32 bits per cell; atomic so overlapping splats can race safely.
    cells: Vec<AtomicU32>,
    /// Precomputed kernel offsets and radial falloff weights.
    kernel: Vec<(i32, i32, i32, f32)>,
}

impl DensityField {
    /// Allocate a `res³` grid covering `[-half_extent, half_extent]³`.
    ///
    /// Fails rather than proceeding with a degenerate or oversized buffer.
    pub fn new(res: usize, half_extent: f32) -> Result<Self, LayoutError> {
        if res == 0 {
            return Err(LayoutError::ZeroResolution);
        }
        let cells = res
            .checked_mul(res)
            .and_then(|c| c.checked_mul(res))
            .filter(|&c| c <= MAX_DENSITY_CELLS)
            .ok_or(LayoutError::GridTooLarge {
                res,
                max: MAX_DENSITY_CELLS,
            })?;

        // Radial falloff: 1 / (1 + d²) in voxel units, over a cube of
        // radius SPLAT_RADIUS.
        let mut kernel = Vec::new();
        for dx in -SPLAT_RADIUS..=SPLAT_RADIUS {
            for dy in -SPLAT_RADIUS..=SPLAT_RADIUS {
                for dz in -SPLAT_RADIUS..=SPLAT_RADIUS {
                    let d2 = (dx * dx + dy * dy + dz * dz) as f32;
                    kernel.push((dx, dy, dz, 1.0 / (1.0 + d2)));
                }
            }
        }

        Ok(Self {
            res,
            half_extent,
            cell_size: 2.0 * half_extent / res as f32,
            cells: (0..cells).map(|_| AtomicU32::new(0)).collect(),
            kernel,
        })
    }

    pub fn resolution(&self) -> usize {
        self.res
    }

    /// Voxel coordinates of a world position, clamped into the grid.
    #[inline]
    fn voxel_of(&self, p: Vec3) -> (i32, i32, i32) {
        let max = self.res as i32 - 1;
        let to_cell = |c: f32| (((c + self.half_extent) / self.cell_size) as i32).clamp(0, max);
        (to_cell(p.x), to_cell(p.y), to_cell(p.z))
    }

    #[inline]
    fn cell_index(&self, x: i32, y: i32, z: i32) -> usize {
        (x as usize * self.res + y as usize) * self.res + z as usize
    }

    /// Lock-free f32 add into one cell.
    #[inline]
    fn add(&self, idx: usize, v: f32) {
        let cell = &self.cells[idx];
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let updated = (f32::from_bits(current) + v).to_bits();
            match cell.compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    fn apply(&self, p: Vec3, sign: f32) {
        let (cx, cy, cz) = self.voxel_of(p);
        let max = self.res as i32;
        for &(dx, dy, dz, w) in &self.kernel {
            let (x, y, z) = (cx + dx, cy + dy, cz + dz);
            if x < 0 || y < 0 || z < 0 || x >= max || y >= max || z >= max {
                continue;
            }
            self.add(self.cell_index(x, y, z), sign * w);
        }
    }

    /// Add a vertex's occupancy kernel at `p`.
    #[inline]
    pub fn splat(&self, p: Vec3) {
        self.apply(p, 1.0);
    }

    /// Remove a previously splatted kernel at `p`.
    #[inline]
    pub fn unsplat(&self, p: Vec3) {
        self.apply(p, -1.0);
    }

    /// Density at the voxel containing `p` (nearest-cell sample).
    #[inline]
    pub fn sample(&self, p: Vec3) -> f32 {
        let (x, y, z) = self.voxel_of(p);
        f32::from_bits(self.cells[self.cell_index(x, y, z)].load(Ordering::Relaxed))
    }

    /// Sum of all cells. Diagnostic; equals kernel mass × live splat count
    /// (minus boundary clipping).
    pub fn total(&self) -> f32 {
        self.cells
            .iter()
            .map(|c| f32::from_bits(c.load(Ordering::Relaxed)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splat_unsplat_cancels() {
        let field = DensityField::new(16, 10.0).unwrap();
        let p = Vec3::new(1.0, -2.0, 3.0);
        field.splat(p);
        assert!(field.sample(p) > 0.0);
        field.unsplat(p);
        assert!(field.total().abs() < 1e-4);
    }

    #[test]
    fn test_sample_peaks_at_splat() {
        let field = DensityField::new(32, 10.0).unwrap();
        let p = Vec3::new(2.0, 2.0, 2.0);
        field.splat(p);
        let near = field.sample(p);
        let far = field.sample(Vec3::new(-8.0, -8.0, -8.0));
        assert!(near > far);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn test_boundary_positions_clamp() {
        let field = DensityField::new(8, 5.0).unwrap();
        // Far outside the volume; must clamp, not panic.
        field.splat(Vec3::splat(1000.0));
        field.unsplat(Vec3::splat(1000.0));
        assert!(field.total().abs() < 1e-4);
    }

    #[test]
    fn test_init_failures() {
        assert!(matches!(
            DensityField::new(0, 10.0),
            Err(LayoutError::ZeroResolution)
        ));
        assert!(matches!(
            DensityField::new(4096, 10.0),
            Err(LayoutError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_concurrent_splats_are_lossless() {
        use rayon::prelude::*;
        let field = DensityField::new(16, 10.0).unwrap();
        let points: Vec<Vec3> = (0..256)
            .map(|i| Vec3::splat((i % 7) as f32 - 3.0))
            .collect();
        points.par_iter().for_each(|&p| field.splat(p));
        points.par_iter().for_each(|&p| field.unsplat(p));
        assert!(field.total().abs() < 1e-2);
    }
}
