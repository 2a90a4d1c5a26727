//! 2D Hilbert curve index.
//!
//! Maps grid coordinates to their distance along a Hilbert space-filling
//! curve, so that sorting by the index groups spatially adjacent cells.

/// Distance along the order-`order` Hilbert curve of grid cell `(x, y)`.
///
/// The grid is `2^order` cells per side; `x` and `y` must be below that.
/// Standard rotate-and-accumulate formulation.
pub fn hilbert_index(order: u32, x: u32, y: u32) -> u64 {
    let n = 1u32 << order;
    debug_assert!(x < n && y < n);

    let (mut x, mut y) = (x, y);
    let mut d: u64 = 0;
    let mut s = n >> 1;
    while s > 0 {
        let rx = u32::from(x & s > 0);
        let ry = u32::from(y & s > 0);
        d += (s as u64) * (s as u64) * ((3 * rx) ^ ry) as u64;

        // Rotate the quadrant
        if ry == 0 {
            if rx == 1 {
                x = (n - 1) - x;
                y = (n - 1) - y;
            }
            std::mem::swap(&mut x, &mut y);
        }
        s >>= 1;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_one_quadrants() {
        // Order-1 curve visits (0,0) (0,1) (1,1) (1,0).
        assert_eq!(hilbert_index(1, 0, 0), 0);
        assert_eq!(hilbert_index(1, 0, 1), 1);
        assert_eq!(hilbert_index(1, 1, 1), 2);
        assert_eq!(hilbert_index(1, 1, 0), 3);
    }

    #[test]
    fn test_bijective_small_grid() {
        let order = 4;
        let n = 1u32 << order;
        let mut seen = vec![false; (n * n) as usize];
        for x in 0..n {
            for y in 0..n {
                let d = hilbert_index(order, x, y) as usize;
                assert!(d < seen.len());
                assert!(!seen[d], "duplicate index {} at ({}, {})", d, x, y);
                seen[d] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_consecutive_indices_are_grid_adjacent() {
        let order = 5;
        let n = 1u32 << order;
        let mut by_index = vec![(0u32, 0u32); (n * n) as usize];
        for x in 0..n {
            for y in 0..n {
                by_index[hilbert_index(order, x, y) as usize] = (x, y);
            }
        }
        for w in by_index.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            let manhattan = x0.abs_diff(x1) + y0.abs_diff(y1);
            assert_eq!(manhattan, 1, "curve jumps from {:?} to {:?}", w[0], w[1]);
        }
    }
}
