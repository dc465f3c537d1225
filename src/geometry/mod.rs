mod aabb;
mod ray_packet;
mod ray_triangle_intersection;
mod triangle;

pub use aabb::AABB;
pub use ray_packet::{Hit, INVALID_ID, LaneIds, MAX_LANES, PacketFloat, RayPacket};
pub use ray_triangle_intersection::{CullMode, TriangleIntersector};
pub use triangle::Triangle;

pub use crate::util::simba::SimbaWorkarounds;

use nalgebra::{Point3, Vector3};
use simba::simd::{WideBoolF32x8, WideF32x8};

pub type FloatType = f32;
pub type SimdFloatType = WideF32x8;
pub type SimdMaskType = WideBoolF32x8;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldBox = AABB<WorldPoint>;

/// Ray packet of the default SIMD width.
pub type RayPacket8 = RayPacket<SimdFloatType>;

/// A single ray, used to fill lanes of a [`RayPacket`].
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Direction of the ray, not necessarily normalized.
    /// Hit distances are measured in multiples of its length.
    pub direction: WorldVector,

    pub tnear: FloatType,
    pub tfar: FloatType,

    /// Visibility mask, the ray only sees primitives sharing at least one bit with it.
    pub mask: u32,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray {
            origin,
            direction,
            tnear: 0.0,
            tfar: FloatType::INFINITY,
            mask: u32::MAX,
        }
    }

    pub fn with_range(self, tnear: FloatType, tfar: FloatType) -> Ray {
        Ray {
            tnear,
            tfar,
            ..self
        }
    }

    pub fn with_mask(self, mask: u32) -> Ray {
        Ray { mask, ..self }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}
