//! Hypercubic lattice geometry: raster indexing and nearest-neighbour bonds.

/// A nearest-neighbour bond between two sites (raster indices).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bond {
    pub first: usize,
    pub second: usize,
    /// The bond closes a periodic boundary.
    pub wraps: bool,
}

/// Row-major strides for `shape`; the last axis is contiguous.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Coordinates of raster index `site`.
pub fn coordinates(shape: &[usize], site: usize) -> Vec<usize> {
    strides(shape)
        .iter()
        .zip(shape)
        .map(|(&stride, &len)| (site / stride) % len)
        .collect()
}

/// All nearest-neighbour bonds of a hypercubic lattice.
///
/// Sites are visited in raster order and, for each site, axes in order.
/// With `pbc` the last site of every axis connects back to the first one; for
/// an axis of length 2 that duplicates the inner bond, for length 1 the self
/// bond is dropped.
pub fn nearest_neighbour_bonds(shape: &[usize], pbc: bool) -> Vec<Bond> {
    let n_sites: usize = shape.iter().product();
    let strides = strides(shape);
    let mut bonds = Vec::with_capacity(n_sites * shape.len());

    for site in 0..n_sites {
        let coords = coordinates(shape, site);
        for (axis, &len) in shape.iter().enumerate() {
            let c = coords[axis];
            if c + 1 < len {
                bonds.push(Bond { first: site, second: site + strides[axis], wraps: false });
            } else if pbc && len > 1 {
                bonds.push(Bond { first: site, second: site - c * strides[axis], wraps: true });
            }
        }
    }
    bonds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_bonds() {
        let open = nearest_neighbour_bonds(&[4], false);
        assert_eq!(open.len(), 3);
        assert!(open.iter().all(|b| !b.wraps));

        let periodic = nearest_neighbour_bonds(&[4], true);
        assert_eq!(periodic.len(), 4);
        assert_eq!(periodic[3], Bond { first: 3, second: 0, wraps: true });
    }

    #[test]
    fn test_square_bonds() {
        // 3x3: 12 inner bonds, 6 wrap bonds
        let periodic = nearest_neighbour_bonds(&[3, 3], true);
        assert_eq!(periodic.len(), 18);
        assert_eq!(periodic.iter().filter(|b| b.wraps).count(), 6);
        assert!(periodic.contains(&Bond { first: 2, second: 0, wraps: true }));
        assert!(periodic.contains(&Bond { first: 6, second: 0, wraps: true }));
        assert_eq!(coordinates(&[3, 3], 5), vec![1, 2]);
    }

    #[test]
    fn test_degenerate_axes() {
        assert!(nearest_neighbour_bonds(&[1], true).is_empty());
        assert_eq!(nearest_neighbour_bonds(&[2], true).len(), 2);
    }
}
