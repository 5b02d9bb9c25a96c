//! Fallback scalar kernel
//!
//! A naive but correct implementation of the quantized dot product that
//! works on any architecture. It decodes each 2-bit weight directly and
//! multiplies in plain integer arithmetic, with no bit-slicing; the
//! bit-sliced vector kernels must reproduce this result exactly. It doubles
//! as the reference implementation for correctness validation.

use crate::cpu::validate_args;
use crate::DotKernel;
use lutdot_common::{Result, QK_I2, WEIGHT_BYTES_PER_BLOCK};

/// Scalar reference dot product over packed 2-bit weights and `i8`
/// activations. Exact integer accumulation; the float cast happens last.
///
/// Within each 128-element block, weight byte `j` holds the elements paired
/// with activations `j`, `j + 32`, `j + 64` and `j + 96`, at bit fields
/// `[7:6]`, `[5:4]`, `[3:2]` and `[1:0]` respectively.
pub fn vec_dot_i2_i8_ref(weights: &[u8], activations: &[i8]) -> Result<f32> {
    validate_args(weights, activations)?;

    let mut sum = 0i32;
    for (wb, ab) in weights
        .chunks_exact(WEIGHT_BYTES_PER_BLOCK)
        .zip(activations.chunks_exact(QK_I2))
    {
        for (j, &byte) in wb.iter().enumerate() {
            for c in 0..4 {
                let w = ((byte >> (6 - 2 * c)) & 0x3) as i32;
                sum += w * ab[32 * c + j] as i32;
            }
        }
    }
    Ok(sum as f32)
}

/// Fallback CPU kernel that works on any architecture
pub struct FallbackKernel;

impl DotKernel for FallbackKernel {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn is_available(&self) -> bool {
        // Fallback kernel is always available
        true
    }

    fn vec_dot_i2_i8(&self, weights: &[u8], activations: &[i8]) -> Result<f32> {
        vec_dot_i2_i8_ref(weights, activations)
    }
}
