//! ARM64 NEON backend for the bit-sliced kernel
//!
//! NEON registers are 128 bits wide, so the 32-lane vectors are modeled as
//! pairs (and the widened accumulators as quads/octets) of registers. The
//! gather is `vqtbl1q_s8` against the 16-entry product table; indices never
//! exceed 15 so a single table register suffices.
#![allow(unsafe_op_in_unsafe_fn)]

use crate::cpu::bitsliced::{vec_dot_blocks, Lanes32};
use crate::cpu::validate_args;
use crate::DotKernel;
use lutdot_common::{KernelError, Result};
use std::arch::aarch64::*;

/// NEON lane backend
///
/// Only sound on ARM64 CPUs with NEON; [`NeonKernel`] checks availability
/// before dispatching into it.
pub struct NeonLanes;

impl Lanes32 for NeonLanes {
    type U8 = [uint8x16_t; 2];
    type I16 = [int16x8_t; 4];
    type I32 = [int32x4_t; 8];
    type Table = int8x16_t;

    #[inline(always)]
    fn load_table(table: &[i8; 32]) -> Self::Table {
        // Indices stay below 16, so only the low (unreplicated) half of the
        // table is needed.
        unsafe { vld1q_s8(table.as_ptr()) }
    }

    #[inline(always)]
    unsafe fn load_u8(ptr: *const u8) -> Self::U8 {
        [vld1q_u8(ptr), vld1q_u8(ptr.add(16))]
    }

    #[inline(always)]
    fn splat_u8(value: u8) -> Self::U8 {
        unsafe { [vdupq_n_u8(value); 2] }
    }

    #[inline(always)]
    fn srl_u8(v: Self::U8, shift: u32) -> Self::U8 {
        unsafe {
            let count = vdupq_n_s8(-(shift as i8));
            [vshlq_u8(v[0], count), vshlq_u8(v[1], count)]
        }
    }

    #[inline(always)]
    fn sll_u8(v: Self::U8, shift: u32) -> Self::U8 {
        unsafe {
            let count = vdupq_n_s8(shift as i8);
            [vshlq_u8(v[0], count), vshlq_u8(v[1], count)]
        }
    }

    #[inline(always)]
    fn and_u8(a: Self::U8, b: Self::U8) -> Self::U8 {
        unsafe { [vandq_u8(a[0], b[0]), vandq_u8(a[1], b[1])] }
    }

    #[inline(always)]
    fn or_u8(a: Self::U8, b: Self::U8) -> Self::U8 {
        unsafe { [vorrq_u8(a[0], b[0]), vorrq_u8(a[1], b[1])] }
    }

    #[inline(always)]
    fn gather(table: Self::Table, idx: Self::U8) -> Self::U8 {
        unsafe {
            [
                vreinterpretq_u8_s8(vqtbl1q_s8(table, idx[0])),
                vreinterpretq_u8_s8(vqtbl1q_s8(table, idx[1])),
            ]
        }
    }

    #[inline(always)]
    fn widen_i8_to_i16(v: Self::U8) -> Self::I16 {
        unsafe {
            let lo = vreinterpretq_s8_u8(v[0]);
            let hi = vreinterpretq_s8_u8(v[1]);
            [
                vmovl_s8(vget_low_s8(lo)),
                vmovl_s8(vget_high_s8(lo)),
                vmovl_s8(vget_low_s8(hi)),
                vmovl_s8(vget_high_s8(hi)),
            ]
        }
    }

    #[inline(always)]
    fn zero_i16() -> Self::I16 {
        unsafe { [vdupq_n_s16(0); 4] }
    }

    #[inline(always)]
    fn add_i16(a: Self::I16, b: Self::I16) -> Self::I16 {
        unsafe {
            [
                vaddq_s16(a[0], b[0]),
                vaddq_s16(a[1], b[1]),
                vaddq_s16(a[2], b[2]),
                vaddq_s16(a[3], b[3]),
            ]
        }
    }

    #[inline(always)]
    fn sll_i16(v: Self::I16, shift: u32) -> Self::I16 {
        unsafe {
            let count = vdupq_n_s16(shift as i16);
            [
                vshlq_s16(v[0], count),
                vshlq_s16(v[1], count),
                vshlq_s16(v[2], count),
                vshlq_s16(v[3], count),
            ]
        }
    }

    #[inline(always)]
    fn neg_i16(v: Self::I16) -> Self::I16 {
        unsafe { [vnegq_s16(v[0]), vnegq_s16(v[1]), vnegq_s16(v[2]), vnegq_s16(v[3])] }
    }

    #[inline(always)]
    fn zero_i32() -> Self::I32 {
        unsafe { [vdupq_n_s32(0); 8] }
    }

    #[inline(always)]
    fn add_i32(a: Self::I32, b: Self::I32) -> Self::I32 {
        let mut out = a;
        for (x, y) in out.iter_mut().zip(b) {
            *x = unsafe { vaddq_s32(*x, y) };
        }
        out
    }

    #[inline(always)]
    fn widen_i16_to_i32(v: Self::I16) -> Self::I32 {
        unsafe {
            [
                vmovl_s16(vget_low_s16(v[0])),
                vmovl_s16(vget_high_s16(v[0])),
                vmovl_s16(vget_low_s16(v[1])),
                vmovl_s16(vget_high_s16(v[1])),
                vmovl_s16(vget_low_s16(v[2])),
                vmovl_s16(vget_high_s16(v[2])),
                vmovl_s16(vget_low_s16(v[3])),
                vmovl_s16(vget_high_s16(v[3])),
            ]
        }
    }

    #[inline(always)]
    fn reduce_i32(v: Self::I32) -> i32 {
        unsafe { v.iter().map(|&x| vaddvq_s32(x)).sum() }
    }
}

#[target_feature(enable = "neon")]
unsafe fn vec_dot_neon(weights: &[u8], activations: &[i8]) -> i32 {
    vec_dot_blocks::<NeonLanes>(weights, activations)
}

/// NEON optimized kernel for ARM64
pub struct NeonKernel;

impl DotKernel for NeonKernel {
    fn name(&self) -> &'static str {
        "neon"
    }

    fn is_available(&self) -> bool {
        // NEON is mandatory on ARM64, but check for safety
        std::arch::is_aarch64_feature_detected!("neon")
    }

    fn vec_dot_i2_i8(&self, weights: &[u8], activations: &[i8]) -> Result<f32> {
        if !self.is_available() {
            return Err(KernelError::UnsupportedHardware {
                required: "NEON".to_string(),
                available: "none".to_string(),
            }
            .into());
        }
        validate_args(weights, activations)?;
        // Safety: lengths validated to whole blocks and NEON is detected.
        let sum = unsafe { vec_dot_neon(weights, activations) };
        Ok(sum as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::fallback::vec_dot_i2_i8_ref;

    #[test]
    fn neon_matches_reference_when_available() {
        if !NeonKernel.is_available() {
            return;
        }
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let weights: Vec<u8> = (0..32 * 5).map(|_| next() as u8).collect();
        let activations: Vec<i8> = (0..128 * 5).map(|_| next() as u8 as i8).collect();

        let expected = vec_dot_i2_i8_ref(&weights, &activations).unwrap();
        let got = NeonKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn neon_harness_scenario() {
        if !NeonKernel.is_available() {
            return;
        }
        let mut weights = vec![0b1010_1010u8; 32];
        weights[2] = 0b1111_1111;
        weights[18] = 0b1111_1111;
        let mut activations = vec![0i8; 128];
        for i in (2..128).step_by(16) {
            activations[i] = -128;
        }
        let got = NeonKernel.vec_dot_i2_i8(&weights, &activations).unwrap();
        assert_eq!(got, -3072.0);
    }
}
