use std::array;

use simba::simd::{SimdBool, SimdValue, WideBoolF32x4, WideBoolF32x8, WideF32x4, WideF32x8};
use wide::{f32x4, f32x8};

const SIGN_BIT: u32 = 1 << 31;

/// Lane bit tricks that simba doesn't expose.
pub trait SimbaWorkarounds: SimdValue {
    /// Keeps only the sign bit of every lane, all other bits are cleared.
    fn sign_bits(self) -> Self;

    /// Bitwise xor of every lane.
    /// Xoring with the output of `sign_bits` of another value flips the sign of every lane
    /// where the other value is negative (including -0.0 and negative NaNs).
    fn xor_bits(self, other: Self) -> Self;

    /// Builds a lane mask from the lowest `LANES` bits, inverse of `SimdBool::bitmask`.
    fn mask_from_bits(bits: u64) -> Self::SimdBool;
}

impl SimbaWorkarounds for f32 {
    #[inline(always)]
    fn sign_bits(self) -> Self {
        f32::from_bits(self.to_bits() & SIGN_BIT)
    }

    #[inline(always)]
    fn xor_bits(self, other: Self) -> Self {
        f32::from_bits(self.to_bits() ^ other.to_bits())
    }

    #[inline(always)]
    fn mask_from_bits(bits: u64) -> bool {
        bits & 1 != 0
    }
}

macro_rules! impl_simba_workarounds_wide {
    ( $simd:ident, $simd_bool:ident, $wide:ident, $lanes:literal ) => {
        impl SimbaWorkarounds for $simd {
            #[inline(always)]
            fn sign_bits(self) -> Self {
                $simd(self.0 & $wide::splat(f32::from_bits(SIGN_BIT)))
            }

            #[inline(always)]
            fn xor_bits(self, other: Self) -> Self {
                $simd(self.0 ^ other.0)
            }

            #[inline(always)]
            fn mask_from_bits(bits: u64) -> $simd_bool {
                let lanes: [f32; $lanes] = array::from_fn(|i| {
                    if (bits >> i) & 1 != 0 {
                        f32::from_bits(u32::MAX)
                    } else {
                        0.0
                    }
                });
                $simd_bool($wide::from(lanes))
            }
        }
    };
}

impl_simba_workarounds_wide!(WideF32x4, WideBoolF32x4, f32x4, 4);
impl_simba_workarounds_wide!(WideF32x8, WideBoolF32x8, f32x8, 8);

/// True if no lane of the mask is set.
#[inline(always)]
pub fn none_active<B: SimdBool>(mask: B) -> bool {
    mask.bitmask() == 0
}
