//! Spatial-hash overlap resolver.
//!
//! A uniform grid with head/next linked buckets, sized so any overlapping
//! pair lands in adjacent cells. One relaxation pass: every overlapping pair
//! is pushed apart symmetrically by half the overlap. Callers invoke it once
//! per de-overlap request; it is not iterated to convergence.

use glam::Vec3;

use super::constants::{MAX_OVERLAP_CELLS, OVERLAP_CELL_EPSILON};

const NO_ENTRY: u32 = u32::MAX;

/// Push overlapping vertices apart in place. `radii[i] * scale` is treated as
/// vertex i's half-size; a pair closer than the sum of half-sizes overlaps.
pub fn resolve_overlaps(positions: &mut [Vec3], radii: &[f32], scale: f32) {
    let n = positions.len();
    assert_eq!(n, radii.len());
    if n < 2 {
        return;
    }

    let max_radius = radii.iter().fold(0.0f32, |a, &r| a.max(r)) * scale;
    if max_radius <= 0.0 {
        return;
    }

    let mut min = positions[0];
    let mut max = positions[0];
    for &p in positions.iter() {
        min = min.min(p);
        max = max.max(p);
    }
    let extent = max - min;

    // Cell size covers the largest possible overlap; doubled while the grid
    // would blow past the cell ceiling.
    let mut cell_size = 2.0 * max_radius + OVERLAP_CELL_EPSILON;
    let dims = loop {
        let dims = [
            (extent.x / cell_size) as usize + 1,
            (extent.y / cell_size) as usize + 1,
            (extent.z / cell_size) as usize + 1,
        ];
        let cells = dims[0]
            .checked_mul(dims[1])
            .and_then(|c| c.checked_mul(dims[2]));
        match cells {
            Some(c) if c <= MAX_OVERLAP_CELLS => break dims,
            _ => cell_size *= 2.0,
        }
    };

    let cell_of = |p: Vec3| -> [usize; 3] {
        let c = (p - min) / cell_size;
        [
            (c.x as usize).min(dims[0] - 1),
            (c.y as usize).min(dims[1] - 1),
            (c.z as usize).min(dims[2] - 1),
        ]
    };
    let cell_index = |c: [usize; 3]| (c[0] * dims[1] + c[1]) * dims[2] + c[2];

    // Singly-linked buckets; cells are fixed at insert time even though the
    // pass mutates positions.
    let mut head = vec![NO_ENTRY; dims[0] * dims[1] * dims[2]];
    let mut next = vec![NO_ENTRY; n];
    let mut home = vec![[0usize; 3]; n];
    for (i, &p) in positions.iter().enumerate() {
        let c = cell_of(p);
        home[i] = c;
        let idx = cell_index(c);
        next[i] = head[idx];
        head[idx] = i as u32;
    }

    for i in 0..n {
        let c = home[i];
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    let x = c[0] as i64 + dx;
                    let y = c[1] as i64 + dy;
                    let z = c[2] as i64 + dz;
                    if x < 0
                        || y < 0
                        || z < 0
                        || x >= dims[0] as i64
                        || y >= dims[1] as i64
                        || z >= dims[2] as i64
                    {
                        continue;
                    }
                    let mut j = head[cell_index([x as usize, y as usize, z as usize])];
                    while j != NO_ENTRY {
                        let ji = j as usize;
                        // Each unordered pair is handled once.
                        if ji > i {
                            separate(positions, radii, scale, i, ji);
                        }
                        j = next[ji];
                    }
                }
            }
        }
    }
}

/// Push vertices `i` and `j` apart by half the overlap each, if they overlap.
#[inline]
fn separate(positions: &mut [Vec3], radii: &[f32], scale: f32, i: usize, j: usize) {
    let min_dist = (radii[i] + radii[j]) * scale;
    let d = positions[j] - positions[i];
    let dist = d.length();
    if dist >= min_dist {
        return;
    }
    let dir = if dist > 1e-6 {
        d / dist
    } else {
        // Coincident points: derive a stable direction from the pair.
        let a = (i.wrapping_mul(31).wrapping_add(j)) as f32;
        Vec3::new(a.sin(), a.cos(), (a * 0.37).sin()).normalize()
    };
    let push = (min_dist - dist) * 0.5;
    positions[i] -= dir * push;
    positions[j] += dir * push;
}
