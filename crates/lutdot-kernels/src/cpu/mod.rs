//! CPU kernel implementations

pub mod bitsliced;
pub mod fallback;

#[cfg(target_arch = "x86_64")]
pub mod x86;

#[cfg(target_arch = "aarch64")]
pub mod arm;

pub use bitsliced::PortableKernel;
pub use fallback::{vec_dot_i2_i8_ref, FallbackKernel};

#[cfg(target_arch = "x86_64")]
pub use x86::Avx2Kernel;

#[cfg(target_arch = "aarch64")]
pub use arm::NeonKernel;

use lutdot_common::{packed_len, KernelError, Result, QK_I2};

/// Validate the dot-product call contract and return the logical element
/// count `n`: activations supply one `i8` per logical element, weights pack
/// four 2-bit values per byte, and `n` must be a positive multiple of the
/// block size.
pub(crate) fn validate_args(weights: &[u8], activations: &[i8]) -> Result<usize> {
    let n = activations.len();
    if n == 0 || n % QK_I2 != 0 {
        return Err(KernelError::InvalidArguments {
            reason: format!("element count must be a positive multiple of {QK_I2}, got {n}"),
        }
        .into());
    }
    if weights.len() != packed_len(n) {
        return Err(KernelError::InvalidArguments {
            reason: format!(
                "packed weight length mismatch: expected {} bytes for {n} elements, got {}",
                packed_len(n),
                weights.len()
            ),
        }
        .into());
    }
    Ok(n)
}
