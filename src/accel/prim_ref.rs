use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    geometry::{FloatType, WorldBox, WorldPoint},
    scene::GeometryId,
};

/// Bounding box of a single primitive, tagged with its owner.
/// Ids occupy the otherwise unused fourth component of each corner.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrimRef {
    lower: [FloatType; 3],
    geom_id: u32,
    upper: [FloatType; 3],
    prim_id: u32,
}

impl PrimRef {
    pub fn new(bounds: &WorldBox, geom_id: GeometryId, prim_id: u32) -> PrimRef {
        debug_assert!(
            bounds.min.iter().zip(bounds.max.iter()).all(|(a, b)| a <= b),
            "primitive bounds must not be empty: {bounds:?}"
        );
        PrimRef {
            lower: bounds.min.into(),
            geom_id: geom_id.raw(),
            upper: bounds.max.into(),
            prim_id,
        }
    }

    pub fn bounds(&self) -> WorldBox {
        WorldBox::new(self.lower.into(), self.upper.into())
    }

    pub fn geom_id(&self) -> GeometryId {
        GeometryId::from_raw(self.geom_id)
    }

    pub fn prim_id(&self) -> u32 {
        self.prim_id
    }

    /// Twice the box center, `lower + upper`.
    pub fn centroid2(&self) -> WorldPoint {
        WorldPoint::from(self.lower) + WorldPoint::from(self.upper).coords
    }
}

impl Default for PrimRef {
    fn default() -> Self {
        PrimRef {
            lower: [FloatType::INFINITY; 3],
            geom_id: u32::MAX,
            upper: [FloatType::NEG_INFINITY; 3],
            prim_id: u32::MAX,
        }
    }
}

/// Bounds of primitive boxes and of their doubled centroids.
#[derive(Clone, Debug, PartialEq)]
pub struct CentroidSceneBounds {
    pub geometry: WorldBox,
    pub centroid2: WorldBox,
}

impl CentroidSceneBounds {
    pub fn empty() -> CentroidSceneBounds {
        CentroidSceneBounds {
            geometry: WorldBox::empty(),
            centroid2: WorldBox::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn extend(&mut self, prim: &PrimRef) {
        self.geometry.include_box(&prim.bounds());
        self.centroid2.include_point(&prim.centroid2());
    }

    pub fn merge(&self, other: &CentroidSceneBounds) -> CentroidSceneBounds {
        CentroidSceneBounds {
            geometry: self.geometry.merge(&other.geometry),
            centroid2: self.centroid2.merge(&other.centroid2),
        }
    }
}

impl Default for CentroidSceneBounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> FromIterator<&'a PrimRef> for CentroidSceneBounds {
    fn from_iter<I: IntoIterator<Item = &'a PrimRef>>(iter: I) -> Self {
        let mut ret = CentroidSceneBounds::empty();
        for prim in iter {
            ret.extend(prim);
        }
        ret
    }
}

/// `CentroidSceneBounds` that can be extended concurrently without locking.
///
/// Every component is updated separately, so a `load` racing with `extend_atomic` may see
/// a partially merged value. Only read it after all writers are joined.
#[derive(Debug)]
pub struct AtomicBounds {
    /// Geometry min, geometry max, centroid min, centroid max; f32 bit patterns.
    components: [AtomicU32; 12],
}

impl AtomicBounds {
    pub fn new() -> AtomicBounds {
        AtomicBounds::from(&CentroidSceneBounds::empty())
    }

    pub fn extend_atomic(&self, bounds: &CentroidSceneBounds) {
        let (mins, maxs) = self.components.split_at(6);
        let corners = [
            (&bounds.geometry.min, &mins[0..3], &maxs[0..3], &bounds.geometry.max),
            (&bounds.centroid2.min, &mins[3..6], &maxs[3..6], &bounds.centroid2.max),
        ];
        for (min, min_slots, max_slots, max) in corners {
            for i in 0..3 {
                atomic_min(&min_slots[i], min[i]);
                atomic_max(&max_slots[i], max[i]);
            }
        }
    }

    pub fn load(&self) -> CentroidSceneBounds {
        let c = |i: usize| FloatType::from_bits(self.components[i].load(Ordering::Acquire));
        let point = |first: usize| WorldPoint::new(c(first), c(first + 1), c(first + 2));
        CentroidSceneBounds {
            geometry: WorldBox::new(point(0), point(6)),
            centroid2: WorldBox::new(point(3), point(9)),
        }
    }
}

impl Default for AtomicBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&CentroidSceneBounds> for AtomicBounds {
    fn from(bounds: &CentroidSceneBounds) -> Self {
        let values = [
            bounds.geometry.min,
            bounds.centroid2.min,
            bounds.geometry.max,
            bounds.centroid2.max,
        ];
        AtomicBounds {
            components: std::array::from_fn(|i| AtomicU32::new(values[i / 3][i % 3].to_bits())),
        }
    }
}

fn atomic_min(slot: &AtomicU32, value: FloatType) {
    let _ = slot.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        (value < FloatType::from_bits(current)).then_some(value.to_bits())
    });
}

fn atomic_max(slot: &AtomicU32, value: FloatType) {
    let _ = slot.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        (value > FloatType::from_bits(current)).then_some(value.to_bits())
    });
}
