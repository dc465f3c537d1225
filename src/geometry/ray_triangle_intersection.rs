//! Packet ray / triangle intersection.
//!
//! The test works with edge functions evaluated in ray-relative coordinates (a Plücker style
//! formulation). Edge and depth coefficients are all left multiplied by the signed
//! denominator and their signs get aligned by xoring with the denominator's sign bit,
//! so the inside test needs no division, no branch and no epsilon.
//! The order of operations decides how rays grazing edges or running parallel to the
//! triangle get classified, keep it.

use nalgebra::Vector3;
use num_traits::zero;
use simba::simd::SimdBool;

use super::{LaneIds, PacketFloat, RayPacket};
use crate::{
    accel::TriangleRecord,
    util::{bit_iter, simba::none_active},
};

/// Which triangle sides can be hit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CullMode {
    /// Both sides are hit, only rays parallel to the triangle are rejected.
    #[default]
    None,
    /// Only rays with a positive denominator (coming from the front side) hit.
    Back,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct TriangleIntersector {
    pub cull_mode: CullMode,
}

/// Lanes of a packet that passed all tests with a single triangle.
/// Coefficients are scaled by `abs_den`.
struct PacketTriangleHit<T: PacketFloat> {
    valid: T::SimdBool,
    u: T,
    v: T,
    t: T,
    abs_den: T,
    normal: Vector3<T>,
}

impl TriangleIntersector {
    pub fn new(cull_mode: CullMode) -> Self {
        TriangleIntersector { cull_mode }
    }

    /// Finds nearest hits of active lanes of the packet with a list of triangles.
    ///
    /// A lane's hit gets overwritten only by a hit that lies within its current
    /// `[tnear, tfar]` and `tfar` shrinks to the new hit, so the result doesn't depend on
    /// the order of the triangles.
    pub fn intersect<T: PacketFloat>(
        &self,
        valid: T::SimdBool,
        packet: &mut RayPacket<T>,
        triangles: &[TriangleRecord],
    ) {
        if none_active(valid) {
            return;
        }

        for triangle in triangles {
            let Some(hit) = self.test(valid, packet, triangle) else {
                continue;
            };

            packet.u = (hit.u / hit.abs_den).select(hit.valid, packet.u);
            packet.v = (hit.v / hit.abs_den).select(hit.valid, packet.v);
            packet.tfar = (hit.t / hit.abs_den).select(hit.valid, packet.tfar);
            packet.normal = hit
                .normal
                .zip_map(&packet.normal, |new, old| new.select(hit.valid, old));

            for lane in bit_iter(hit.valid.bitmask()) {
                packet.geom_id[lane] = triangle.geom_id;
                packet.prim_id[lane] = triangle.prim_id;
            }
        }
    }

    /// Tests active lanes of the packet for any hit with the list of triangles.
    ///
    /// Returns complement of the lanes that are still searching for an occluder,
    /// that is lanes that found a hit together with lanes that were not active.
    pub fn occluded<T: PacketFloat>(
        &self,
        valid: T::SimdBool,
        packet: &RayPacket<T>,
        triangles: &[TriangleRecord],
    ) -> T::SimdBool {
        let mut searching = valid;

        for triangle in triangles {
            if let Some(hit) = self.test(searching, packet, triangle) {
                searching = searching & !hit.valid;
            }
            if none_active(searching) {
                break;
            }
        }

        !searching
    }

    /// Like `occluded`, but over several triangle lists (typically leaves).
    /// Lanes that found an occluder in one list are not tested against the following ones.
    pub fn occluded_containers<'a, T: PacketFloat>(
        &self,
        valid: T::SimdBool,
        packet: &RayPacket<T>,
        containers: impl IntoIterator<Item = &'a [TriangleRecord]>,
    ) -> T::SimdBool {
        let mut searching = valid;

        for triangles in containers {
            if none_active(searching) {
                break;
            }
            searching = searching & !self.occluded(searching, packet, triangles);
        }

        !searching
    }

    fn test<T: PacketFloat>(
        &self,
        valid: T::SimdBool,
        packet: &RayPacket<T>,
        triangle: &TriangleRecord,
    ) -> Option<PacketTriangleHit<T>> {
        let mut valid = valid;
        let origin = packet.origin;
        let direction = packet.direction;

        // Vertices relative to the ray origin
        let v0 = triangle.vertices[0].map(T::splat) - origin;
        let v1 = triangle.vertices[1].map(T::splat) - origin;
        let v2 = triangle.vertices[2].map(T::splat) - origin;

        let e0 = v2 - v0;
        let e1 = v0 - v1;
        let e2 = v1 - v2;

        let normal = e1.cross(&e0);
        let normal2 = normal + normal;
        let den = normal2.dot(&direction);
        let abs_den = den.simd_abs();
        let sgn_den = den.sign_bits();

        // Edge tests
        let u = (v2 + v0).cross(&e0).dot(&direction).xor_bits(sgn_den);
        valid = valid & u.simd_ge(zero());
        if none_active(valid) {
            return None;
        }
        let v = (v0 + v1).cross(&e1).dot(&direction).xor_bits(sgn_den);
        valid = valid & v.simd_ge(zero());
        if none_active(valid) {
            return None;
        }
        let w = (v1 + v2).cross(&e2).dot(&direction).xor_bits(sgn_den);
        valid = valid & w.simd_ge(zero());
        if none_active(valid) {
            return None;
        }

        // Depth test
        let t = v0.dot(&normal2).xor_bits(sgn_den);
        valid = valid & t.simd_ge(abs_den * packet.tnear) & (abs_den * packet.tfar).simd_ge(t);
        if none_active(valid) {
            return None;
        }

        valid = valid
            & match self.cull_mode {
                CullMode::Back => den.simd_gt(zero()),
                CullMode::None => !den.simd_eq(zero()),
            };
        if none_active(valid) {
            return None;
        }

        valid = filter_ray_mask::<T>(valid, &packet.mask, triangle.mask);
        if none_active(valid) {
            return None;
        }

        Some(PacketTriangleHit {
            valid,
            u,
            v,
            t,
            abs_den,
            normal: normal2,
        })
    }
}

/// Drops lanes whose ray mask shares no bit with the primitive mask.
fn filter_ray_mask<T: PacketFloat>(
    valid: T::SimdBool,
    ray_mask: &LaneIds,
    primitive_mask: u32,
) -> T::SimdBool {
    let bits = bit_iter(valid.bitmask())
        .filter(|&lane| ray_mask[lane] & primitive_mask != 0)
        .fold(0u64, |acc, lane| acc | (1 << lane));
    T::mask_from_bits(bits)
}
