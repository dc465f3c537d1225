use std::ops::Range;

use morton_encoding::morton_encode;

use super::prim_ref::{CentroidSceneBounds, PrimRef};
use crate::geometry::FloatType;

/// Orders primitive references into leaves.
pub trait Topology {
    /// Reorders `prims` in place and returns contiguous, disjoint ranges covering all of them,
    /// one range per leaf.
    fn order(&self, prims: &mut [PrimRef], bounds: &CentroidSceneBounds) -> Vec<Range<usize>>;
}

/// Sorts references along a Morton curve through their centroids and cuts the sorted
/// list into leaves of fixed size.
#[derive(Copy, Clone, Debug)]
pub struct MortonTopology {
    pub max_leaf_size: usize,
}

const GRID_BITS: u32 = 10;
const GRID_MAX: FloatType = ((1 << GRID_BITS) - 1) as FloatType;

impl MortonTopology {
    pub fn new(max_leaf_size: usize) -> MortonTopology {
        assert!(max_leaf_size > 0, "Leaves must hold at least one primitive");
        MortonTopology { max_leaf_size }
    }
}

impl Topology for MortonTopology {
    fn order(&self, prims: &mut [PrimRef], bounds: &CentroidSceneBounds) -> Vec<Range<usize>> {
        if prims.is_empty() {
            return Vec::new();
        }

        // Both the centroids and their bounds are doubled, the grid mapping is unaffected.
        let min = bounds.centroid2.min;
        let scale = bounds
            .centroid2
            .size()
            .map(|extent| if extent > 0.0 { GRID_MAX / extent } else { 0.0 });

        prims.sort_by_cached_key(|prim| {
            let grid_coordinates: [u32; 3] = (prim.centroid2() - min)
                .component_mul(&scale)
                .map(|x| x.clamp(0.0, GRID_MAX).round() as u32)
                .into();

            morton_encode(grid_coordinates)
        });

        let count = prims.len();
        (0..count)
            .step_by(self.max_leaf_size)
            .map(|start| start..(start + self.max_leaf_size).min(count))
            .collect()
    }
}
