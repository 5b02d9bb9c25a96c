//! Bit-sliced LUT dot product, generic over a 32-lane vector backend
//!
//! The algorithm decomposes each packed weight byte into four 2-bit streams
//! and each signed activation byte into five bit-slices (2-bit groups at
//! shifts 0, 2 and 4; single bits at shifts 6 and 7). Every partial product
//! is then a 2-bit × 2-bit multiply, answered by a gather from the 16-entry
//! product table, and the slices are recombined by shift-weighted
//! accumulation. The shift-7 slice is subtracted: the top bit of a signed
//! byte carries place value -128, not +128.
//!
//! The algorithm is written once against the [`Lanes32`] trait so backends
//! only supply the primitive lane operations. [`PortableLanes`] works on any
//! architecture; AVX2 and NEON backends live in the sibling modules.

use crate::cpu::validate_args;
use crate::lut::REPLICATED_LUT;
use crate::DotKernel;
use lutdot_common::{block_count, Result, LANES, QK_I2, WEIGHT_BYTES_PER_BLOCK};

/// Activation bit-slice shifts, in accumulation order
const SHIFTS: [u32; 5] = [0, 2, 4, 6, 7];

// A block is exactly four lane-wide activation chunks against one lane-wide
// packed weight chunk.
const _: () = assert!(QK_I2 == 4 * LANES && WEIGHT_BYTES_PER_BLOCK == LANES);

/// Primitive operations over 32 parallel lanes
///
/// `U8` carries 32 byte lanes (weights, activations and gather indices),
/// `I16` and `I32` the widened accumulator lanes. Gather indices must stay
/// below 32; the kernel only ever builds 4-bit indices.
pub trait Lanes32 {
    type U8: Copy;
    type I16: Copy;
    type I32: Copy;
    type Table: Copy;

    fn load_table(table: &[i8; 32]) -> Self::Table;

    /// Load 32 bytes.
    ///
    /// # Safety
    /// `ptr` must be valid for 32 bytes of reads.
    unsafe fn load_u8(ptr: *const u8) -> Self::U8;

    fn splat_u8(value: u8) -> Self::U8;
    fn srl_u8(v: Self::U8, shift: u32) -> Self::U8;
    fn sll_u8(v: Self::U8, shift: u32) -> Self::U8;
    fn and_u8(a: Self::U8, b: Self::U8) -> Self::U8;
    fn or_u8(a: Self::U8, b: Self::U8) -> Self::U8;

    /// Per-lane table lookup; lane i becomes `table[idx[i]]` (as i8 bits).
    fn gather(table: Self::Table, idx: Self::U8) -> Self::U8;

    fn widen_i8_to_i16(v: Self::U8) -> Self::I16;
    fn zero_i16() -> Self::I16;
    fn add_i16(a: Self::I16, b: Self::I16) -> Self::I16;
    fn sll_i16(v: Self::I16, shift: u32) -> Self::I16;
    fn neg_i16(v: Self::I16) -> Self::I16;

    fn zero_i32() -> Self::I32;
    fn add_i32(a: Self::I32, b: Self::I32) -> Self::I32;
    fn widen_i16_to_i32(v: Self::I16) -> Self::I32;
    fn reduce_i32(v: Self::I32) -> i32;
}

/// Bit-sliced dot product over whole blocks.
///
/// Every block contributes at most ±2^11 per i16 lane before widening, so
/// the 16-bit block accumulator cannot overflow; the 32-bit lane accumulator
/// covers any practical element count.
///
/// # Safety
/// `weights.len()` must equal `32 * nb` and `activations.len()` must equal
/// `128 * nb` for the same block count `nb` (see [`validate_args`]), and the
/// backend `L` must be supported on the running CPU.
#[inline(always)]
pub(crate) unsafe fn vec_dot_blocks<L: Lanes32>(weights: &[u8], activations: &[i8]) -> i32 {
    let table = L::load_table(&REPLICATED_LUT);
    let mask2 = L::splat_u8(0x03);
    let mask1 = L::splat_u8(0x01);
    let mut accu = L::zero_i32();

    let nb = block_count(activations.len());
    for b in 0..nb {
        let w_ptr = weights.as_ptr().add(b * WEIGHT_BYTES_PER_BLOCK);
        let a_ptr = activations.as_ptr().add(b * QK_I2) as *const u8;

        let packed = L::load_u8(w_ptr);
        let act = [
            L::load_u8(a_ptr),
            L::load_u8(a_ptr.add(32)),
            L::load_u8(a_ptr.add(64)),
            L::load_u8(a_ptr.add(96)),
        ];

        // One 2-bit weight stream per activation chunk: bits [7:6] pair
        // with chunk 0, [5:4] with chunk 1, [3:2] with chunk 2, [1:0] with
        // chunk 3. Pre-shifted into index bits [3:2].
        let wt_idx = [
            L::sll_u8(L::and_u8(L::srl_u8(packed, 6), mask2), 2),
            L::sll_u8(L::and_u8(L::srl_u8(packed, 4), mask2), 2),
            L::sll_u8(L::and_u8(L::srl_u8(packed, 2), mask2), 2),
            L::sll_u8(L::and_u8(packed, mask2), 2),
        ];

        let mut block = L::zero_i16();
        for shift in SHIFTS {
            let mask = if shift >= 6 { mask1 } else { mask2 };

            let mut products = [L::zero_i16(); 4];
            for c in 0..4 {
                let idx = L::or_u8(L::and_u8(L::srl_u8(act[c], shift), mask), wt_idx[c]);
                products[c] = L::widen_i8_to_i16(L::gather(table, idx));
            }
            if shift == 7 {
                // Sign bit: contributes -(weight << 7), not +(weight << 7).
                for p in products.iter_mut() {
                    *p = L::neg_i16(*p);
                }
            }
            block = L::add_i16(block, L::sll_i16(L::add_i16(products[0], products[1]), shift));
            block = L::add_i16(block, L::sll_i16(L::add_i16(products[2], products[3]), shift));
        }

        accu = L::add_i32(accu, L::widen_i16_to_i32(block));
    }

    L::reduce_i32(accu)
}

/// Portable array-backed lane implementation, available everywhere
pub struct PortableLanes;

impl Lanes32 for PortableLanes {
    type U8 = [u8; 32];
    type I16 = [i16; 32];
    type I32 = [i32; 32];
    type Table = [i8; 32];

    #[inline(always)]
    fn load_table(table: &[i8; 32]) -> Self::Table {
        *table
    }

    #[inline(always)]
    unsafe fn load_u8(ptr: *const u8) -> Self::U8 {
        let mut out = [0u8; 32];
        std::ptr::copy_nonoverlapping(ptr, out.as_mut_ptr(), 32);
        out
    }

    #[inline(always)]
    fn splat_u8(value: u8) -> Self::U8 {
        [value; 32]
    }

    #[inline(always)]
    fn srl_u8(mut v: Self::U8, shift: u32) -> Self::U8 {
        for lane in v.iter_mut() {
            *lane >>= shift;
        }
        v
    }

    #[inline(always)]
    fn sll_u8(mut v: Self::U8, shift: u32) -> Self::U8 {
        for lane in v.iter_mut() {
            *lane <<= shift;
        }
        v
    }

    #[inline(always)]
    fn and_u8(mut a: Self::U8, b: Self::U8) -> Self::U8 {
        for (x, y) in a.iter_mut().zip(b) {
            *x &= y;
        }
        a
    }

    #[inline(always)]
    fn or_u8(mut a: Self::U8, b: Self::U8) -> Self::U8 {
        for (x, y) in a.iter_mut().zip(b) {
            *x |= y;
        }
        a
    }

    #[inline(always)]
    fn gather(table: Self::Table, idx: Self::U8) -> Self::U8 {
        let mut out = [0u8; 32];
        for (o, i) in out.iter_mut().zip(idx) {
            *o = table[(i & 0x1F) as usize] as u8;
        }
        out
    }

    #[inline(always)]
    fn widen_i8_to_i16(v: Self::U8) -> Self::I16 {
        let mut out = [0i16; 32];
        for (o, x) in out.iter_mut().zip(v) {
            *o = x as i8 as i16;
        }
        out
    }

    #[inline(always)]
    fn zero_i16() -> Self::I16 {
        [0i16; 32]
    }

    #[inline(always)]
    fn add_i16(mut a: Self::I16, b: Self::I16) -> Self::I16 {
        for (x, y) in a.iter_mut().zip(b) {
            *x += y;
        }
        a
    }

    #[inline(always)]
    fn sll_i16(mut v: Self::I16, shift: u32) -> Self::I16 {
        for lane in v.iter_mut() {
            *lane <<= shift;
        }
        v
    }

    #[inline(always)]
    fn neg_i16(mut v: Self::I16) -> Self::I16 {
        for lane in v.iter_mut() {
            *lane = -*lane;
        }
        v
    }

    #[inline(always)]
    fn zero_i32() -> Self::I32 {
        [0i32; 32]
    }

    #[inline(always)]
    fn add_i32(mut a: Self::I32, b: Self::I32) -> Self::I32 {
        for (x, y) in a.iter_mut().zip(b) {
            *x += y;
        }
        a
    }

    #[inline(always)]
    fn widen_i16_to_i32(v: Self::I16) -> Self::I32 {
        let mut out = [0i32; 32];
        for (o, x) in out.iter_mut().zip(v) {
            *o = x as i32;
        }
        out
    }

    #[inline(always)]
    fn reduce_i32(v: Self::I32) -> i32 {
        v.iter().sum()
    }
}

/// Bit-sliced kernel on the portable backend
pub struct PortableKernel;

impl DotKernel for PortableKernel {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn vec_dot_i2_i8(&self, weights: &[u8], activations: &[i8]) -> Result<f32> {
        validate_args(weights, activations)?;
        // Safety: lengths validated to whole blocks; portable backend has
        // no hardware requirements.
        let sum = unsafe { vec_dot_blocks::<PortableLanes>(weights, activations) };
        Ok(sum as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::fallback::vec_dot_i2_i8_ref;

    fn assert_matches_reference(weights: &[u8], activations: &[i8]) {
        let expected = vec_dot_i2_i8_ref(weights, activations).unwrap();
        let got = PortableKernel.vec_dot_i2_i8(weights, activations).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn portable_matches_reference_on_harness_scenario() {
        let mut weights = vec![0b1010_1010u8; 32];
        weights[2] = 0b1111_1111;
        weights[18] = 0b1111_1111;
        let mut activations = vec![0i8; 128];
        for i in (2..128).step_by(16) {
            activations[i] = -128;
        }
        let result = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        assert_eq!(result, -3072.0);
        assert_matches_reference(&weights, &activations);
    }

    #[test]
    fn portable_handles_extreme_activations() {
        // Every activation at i8::MIN with maximal weights stresses the
        // shift-7 negation and the accumulator bounds.
        let weights = vec![0xFFu8; 32];
        let activations = vec![-128i8; 128];
        let result = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        assert_eq!(result, (3 * -128 * 128) as f32);
        assert_matches_reference(&weights, &activations);
    }

    #[test]
    fn portable_covers_every_weight_field() {
        // A distinct weight in each field of the first byte.
        let mut weights = vec![0u8; 32];
        weights[0] = 0b01_10_11_00; // fields: 1, 2, 3, 0
        let mut activations = vec![0i8; 128];
        activations[0] = 5; // chunk 0 -> weight 1
        activations[32] = 7; // chunk 1 -> weight 2
        activations[64] = -9; // chunk 2 -> weight 3
        activations[96] = 11; // chunk 3 -> weight 0
        let result = PortableKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        assert_eq!(result, (5 + 14 - 27) as f32);
        assert_matches_reference(&weights, &activations);
    }

    #[test]
    fn portable_rejects_partial_blocks() {
        let weights = vec![0u8; 16];
        let activations = vec![0i8; 64];
        assert!(PortableKernel.vec_dot_i2_i8(&weights, &activations).is_err());
    }

    #[test]
    fn gather_masks_index_to_table_range() {
        let idx = PortableLanes::splat_u8(0x2F); // 0x2F & 0x1F == 0x0F
        let table = PortableLanes::load_table(&REPLICATED_LUT);
        let out = PortableLanes::gather(table, idx);
        assert!(out.iter().all(|&v| v as i8 == REPLICATED_LUT[0x0F]));
    }
}
