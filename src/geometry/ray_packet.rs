use arrayvec::ArrayVec;
use assert2::debug_assert;
use nalgebra::{Point3, Vector3};
use num_traits::zero;
use simba::simd::SimdRealField;

use super::{FloatType, Ray, SimbaWorkarounds, WorldVector};

/// Widest packet supported.
pub const MAX_LANES: usize = 16;

/// Geometry and primitive id of lanes that didn't hit anything.
pub const INVALID_ID: u32 = u32::MAX;

/// Per lane integer data of a packet.
pub type LaneIds = ArrayVec<u32, MAX_LANES>;

/// Lane type of a ray packet.
/// Implemented for `f32` (single ray), `WideF32x4` and `WideF32x8`.
pub trait PacketFloat: SimdRealField<Element = FloatType> + SimbaWorkarounds + Copy {
    /// Mask with every lane set.
    fn all_lanes() -> Self::SimdBool {
        Self::mask_from_bits(u64::MAX)
    }
}

impl<T: SimdRealField<Element = FloatType> + SimbaWorkarounds + Copy> PacketFloat for T {}

/// Packet of independent rays processed together.
///
/// Hit output of a lane is only meaningful if its `geom_id` is not [`INVALID_ID`].
/// Distance of the hit is stored in `tfar`, which only ever decreases.
#[derive(Clone, Debug)]
pub struct RayPacket<T: PacketFloat> {
    pub origin: Point3<T>,
    pub direction: Vector3<T>,
    pub tnear: T,
    pub tfar: T,

    /// Barycentric coordinates of the hit, relative to the second and third vertex
    pub u: T,
    pub v: T,

    /// Unnormalized geometric normal of the hit primitive
    pub normal: Vector3<T>,

    pub geom_id: LaneIds,
    pub prim_id: LaneIds,

    /// Visibility mask of each ray
    pub mask: LaneIds,
}

/// Hit of a single lane of a packet.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub t: FloatType,
    pub u: FloatType,
    pub v: FloatType,
    pub normal: WorldVector,
    pub geom_id: u32,
    pub prim_id: u32,
}

impl<T: PacketFloat> RayPacket<T> {
    /// Creates a packet with every lane set to the same ray.
    pub fn splat(ray: &Ray) -> Self {
        debug_assert!(T::LANES <= MAX_LANES);
        RayPacket {
            origin: ray.origin.map(T::splat),
            direction: ray.direction.map(T::splat),
            tnear: T::splat(ray.tnear),
            tfar: T::splat(ray.tfar),
            u: zero(),
            v: zero(),
            normal: Vector3::zeros(),
            geom_id: (0..T::LANES).map(|_| INVALID_ID).collect(),
            prim_id: (0..T::LANES).map(|_| INVALID_ID).collect(),
            mask: (0..T::LANES).map(|_| ray.mask).collect(),
        }
    }

    /// Groups rays into packets.
    /// Returns packets along with masks of lanes that hold a ray. Unused lanes of the last
    /// packet repeat the last ray, but are never active.
    pub fn from_rays(
        rays: impl IntoIterator<Item = Ray>,
    ) -> impl Iterator<Item = (RayPacket<T>, T::SimdBool)> {
        let mut rays = rays.into_iter();
        std::iter::from_fn(move || {
            let first = rays.next()?;
            let mut packet = RayPacket::splat(&first);
            let mut active = 1u64;

            for (lane, ray) in (1..T::LANES).zip(&mut rays) {
                packet.set_ray(lane, &ray);
                active |= 1 << lane;
            }

            Some((packet, T::mask_from_bits(active)))
        })
    }

    /// Overwrites input of a single lane and resets its hit.
    pub fn set_ray(&mut self, lane: usize, ray: &Ray) {
        for i in 0..3 {
            self.origin[i].replace(lane, ray.origin[i]);
            self.direction[i].replace(lane, ray.direction[i]);
            self.normal[i].replace(lane, 0.0);
        }
        self.tnear.replace(lane, ray.tnear);
        self.tfar.replace(lane, ray.tfar);
        self.u.replace(lane, 0.0);
        self.v.replace(lane, 0.0);
        self.geom_id[lane] = INVALID_ID;
        self.prim_id[lane] = INVALID_ID;
        self.mask[lane] = ray.mask;
    }

    pub fn lanes(&self) -> usize {
        T::LANES
    }

    /// Distance of the nearest hit found so far (same as `tfar`).
    pub fn t(&self) -> T {
        self.tfar
    }

    pub fn hit(&self, lane: usize) -> Option<Hit> {
        if self.geom_id[lane] == INVALID_ID {
            return None;
        }

        Some(Hit {
            t: self.tfar.extract(lane),
            u: self.u.extract(lane),
            v: self.v.extract(lane),
            normal: self.normal.map(|x| x.extract(lane)),
            geom_id: self.geom_id[lane],
            prim_id: self.prim_id[lane],
        })
    }

    pub fn hits(&self) -> impl Iterator<Item = Option<Hit>> + '_ {
        (0..T::LANES).map(|lane| self.hit(lane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SimdFloatType, WorldPoint};

    use assert2::{assert, let_assert};
    use simba::simd::{SimdBool as _, SimdValue as _};

    fn ray(i: usize) -> Ray {
        Ray::new(
            WorldPoint::new(i as f32, 0.0, 0.0),
            WorldVector::new(0.0, 0.0, 1.0),
        )
        .with_range(0.5, 10.0 + i as f32)
        .with_mask(1 << i)
    }

    #[test]
    fn splat_fills_every_lane() {
        let packet = RayPacket::<SimdFloatType>::splat(&ray(3));
        assert!(packet.lanes() == 8);
        for lane in 0..8 {
            assert!(packet.origin.x.extract(lane) == 3.0);
            assert!(packet.tfar.extract(lane) == 13.0);
            assert!(packet.mask[lane] == 1 << 3);
            assert!(packet.hit(lane).is_none());
        }
    }

    #[test]
    fn from_rays_partial_fill() {
        let packets: Vec<_> = RayPacket::<SimdFloatType>::from_rays((0..10).map(ray)).collect();
        assert!(packets.len() == 2);

        let (first, first_mask) = &packets[0];
        assert!(first_mask.bitmask() == 0xff);
        assert!(first.origin.x.extract(7) == 7.0);
        assert!(first.tnear.extract(7) == 0.5);

        let (second, second_mask) = &packets[1];
        assert!(second_mask.bitmask() == 0b11);
        assert!(second.origin.x.extract(1) == 9.0);
        assert!(second.mask[1] == 1 << 9);
    }

    #[test]
    fn from_rays_empty() {
        let packets: Vec<_> = RayPacket::<SimdFloatType>::from_rays(std::iter::empty()).collect();
        assert!(packets.is_empty());
    }

    #[test]
    fn from_rays_single_lane() {
        let packets: Vec<_> = RayPacket::<f32>::from_rays((0..3).map(ray)).collect();
        assert!(packets.len() == 3);
        let_assert!(Some((packet, mask)) = packets.last());
        assert!(*mask);
        assert!(packet.origin.x == 2.0);
    }

    #[test]
    fn all_lanes_mask() {
        assert!(SimdFloatType::all_lanes().bitmask() == 0xff);
        assert!(f32::all_lanes());
    }
}
