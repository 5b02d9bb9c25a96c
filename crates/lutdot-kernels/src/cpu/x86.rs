//! x86_64 AVX2 backend for the bit-sliced kernel
//!
//! The 32-entry replicated LUT occupies one 256-bit register with the
//! 16-entry product table in each 128-bit half, so `_mm256_shuffle_epi8`
//! serves as the per-lane gather (indices never exceed 15). AVX2 has no
//! 8-bit shifts; they are emulated with 16-bit shifts plus a byte mask.
#![allow(unsafe_op_in_unsafe_fn)]

use crate::cpu::bitsliced::{vec_dot_blocks, Lanes32};
use crate::cpu::validate_args;
use crate::DotKernel;
use lutdot_common::{KernelError, Result};
use std::arch::x86_64::*;

/// AVX2 lane backend
///
/// Only sound on CPUs with AVX2; [`Avx2Kernel`] checks availability before
/// dispatching into it.
pub struct Avx2Lanes;

impl Lanes32 for Avx2Lanes {
    type U8 = __m256i;
    type I16 = [__m256i; 2];
    type I32 = [__m256i; 4];
    type Table = __m256i;

    #[inline(always)]
    fn load_table(table: &[i8; 32]) -> Self::Table {
        unsafe { _mm256_loadu_si256(table.as_ptr() as *const __m256i) }
    }

    #[inline(always)]
    unsafe fn load_u8(ptr: *const u8) -> Self::U8 {
        _mm256_loadu_si256(ptr as *const __m256i)
    }

    #[inline(always)]
    fn splat_u8(value: u8) -> Self::U8 {
        unsafe { _mm256_set1_epi8(value as i8) }
    }

    #[inline(always)]
    fn srl_u8(v: Self::U8, shift: u32) -> Self::U8 {
        unsafe {
            let count = _mm_cvtsi32_si128(shift as i32);
            let keep = _mm256_set1_epi8((0xFFu8 >> shift) as i8);
            _mm256_and_si256(_mm256_srl_epi16(v, count), keep)
        }
    }

    #[inline(always)]
    fn sll_u8(v: Self::U8, shift: u32) -> Self::U8 {
        unsafe {
            let count = _mm_cvtsi32_si128(shift as i32);
            let keep = _mm256_set1_epi8((0xFFu8 << shift) as i8);
            _mm256_and_si256(_mm256_sll_epi16(v, count), keep)
        }
    }

    #[inline(always)]
    fn and_u8(a: Self::U8, b: Self::U8) -> Self::U8 {
        unsafe { _mm256_and_si256(a, b) }
    }

    #[inline(always)]
    fn or_u8(a: Self::U8, b: Self::U8) -> Self::U8 {
        unsafe { _mm256_or_si256(a, b) }
    }

    #[inline(always)]
    fn gather(table: Self::Table, idx: Self::U8) -> Self::U8 {
        // Per-128-bit-lane shuffle; valid because the table is replicated
        // in both halves and indices stay below 16.
        unsafe { _mm256_shuffle_epi8(table, idx) }
    }

    #[inline(always)]
    fn widen_i8_to_i16(v: Self::U8) -> Self::I16 {
        unsafe {
            [
                _mm256_cvtepi8_epi16(_mm256_castsi256_si128(v)),
                _mm256_cvtepi8_epi16(_mm256_extracti128_si256::<1>(v)),
            ]
        }
    }

    #[inline(always)]
    fn zero_i16() -> Self::I16 {
        unsafe { [_mm256_setzero_si256(); 2] }
    }

    #[inline(always)]
    fn add_i16(a: Self::I16, b: Self::I16) -> Self::I16 {
        unsafe { [_mm256_add_epi16(a[0], b[0]), _mm256_add_epi16(a[1], b[1])] }
    }

    #[inline(always)]
    fn sll_i16(v: Self::I16, shift: u32) -> Self::I16 {
        unsafe {
            let count = _mm_cvtsi32_si128(shift as i32);
            [_mm256_sll_epi16(v[0], count), _mm256_sll_epi16(v[1], count)]
        }
    }

    #[inline(always)]
    fn neg_i16(v: Self::I16) -> Self::I16 {
        unsafe {
            let zero = _mm256_setzero_si256();
            [_mm256_sub_epi16(zero, v[0]), _mm256_sub_epi16(zero, v[1])]
        }
    }

    #[inline(always)]
    fn zero_i32() -> Self::I32 {
        unsafe { [_mm256_setzero_si256(); 4] }
    }

    #[inline(always)]
    fn add_i32(a: Self::I32, b: Self::I32) -> Self::I32 {
        unsafe {
            [
                _mm256_add_epi32(a[0], b[0]),
                _mm256_add_epi32(a[1], b[1]),
                _mm256_add_epi32(a[2], b[2]),
                _mm256_add_epi32(a[3], b[3]),
            ]
        }
    }

    #[inline(always)]
    fn widen_i16_to_i32(v: Self::I16) -> Self::I32 {
        unsafe {
            [
                _mm256_cvtepi16_epi32(_mm256_castsi256_si128(v[0])),
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<1>(v[0])),
                _mm256_cvtepi16_epi32(_mm256_castsi256_si128(v[1])),
                _mm256_cvtepi16_epi32(_mm256_extracti128_si256::<1>(v[1])),
            ]
        }
    }

    #[inline(always)]
    fn reduce_i32(v: Self::I32) -> i32 {
        unsafe {
            let sum = _mm256_add_epi32(
                _mm256_add_epi32(v[0], v[1]),
                _mm256_add_epi32(v[2], v[3]),
            );
            let mut lanes = [0i32; 8];
            _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, sum);
            lanes.iter().sum()
        }
    }
}

#[target_feature(enable = "avx2")]
unsafe fn vec_dot_avx2(weights: &[u8], activations: &[i8]) -> i32 {
    vec_dot_blocks::<Avx2Lanes>(weights, activations)
}

/// AVX2 optimized kernel for x86_64
pub struct Avx2Kernel;

impl DotKernel for Avx2Kernel {
    fn name(&self) -> &'static str {
        "avx2"
    }

    fn is_available(&self) -> bool {
        is_x86_feature_detected!("avx2")
    }

    fn vec_dot_i2_i8(&self, weights: &[u8], activations: &[i8]) -> Result<f32> {
        if !self.is_available() {
            return Err(KernelError::UnsupportedHardware {
                required: "AVX2".to_string(),
                available: "none".to_string(),
            }
            .into());
        }
        validate_args(weights, activations)?;
        // Safety: lengths validated to whole blocks and AVX2 is detected.
        let sum = unsafe { vec_dot_avx2(weights, activations) };
        Ok(sum as f32)
    }
}
