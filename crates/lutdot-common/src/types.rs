//! Quantized block-format constants
//!
//! The I2 format stores 2-bit unsigned weights four to a byte, grouped in
//! blocks of 128 logical elements. Within a block, weight byte `j` packs the
//! logical elements `j`, `j + 32`, `j + 64` and `j + 96` at bit fields
//! `[7:6]`, `[5:4]`, `[3:2]` and `[1:0]` respectively, so that a 32-byte
//! vector load yields one 2-bit field per SIMD lane for each of the four
//! 32-element activation chunks.

/// Logical elements per quantized block
pub const QK_I2: usize = 128;

/// Packed weight values per byte
pub const WEIGHTS_PER_BYTE: usize = 4;

/// Packed weight bytes per block (QK_I2 / WEIGHTS_PER_BYTE)
pub const WEIGHT_BYTES_PER_BLOCK: usize = QK_I2 / WEIGHTS_PER_BYTE;

/// SIMD lane count the kernels are written against
pub const LANES: usize = 32;

/// Number of packed weight bytes required for `n` logical elements
pub const fn packed_len(n: usize) -> usize {
    n / WEIGHTS_PER_BYTE
}

/// Number of blocks covering `n` logical elements (`n` must be a multiple
/// of [`QK_I2`]; callers validate before relying on this)
pub const fn block_count(n: usize) -> usize {
    n / QK_I2
}
