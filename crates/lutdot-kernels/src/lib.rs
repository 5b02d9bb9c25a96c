//! LUT-based dot-product kernels for 2-bit weights and 8-bit activations
//!
//! The core primitive computes `sum(weight(i) * activation(i))` where the
//! weights are 2-bit unsigned values packed four per byte and the
//! activations are signed bytes, using a 16-entry product look-up table and
//! bit-slicing instead of multiplies. Backends share one algorithm written
//! against a 32-lane vector abstraction; a scalar fallback doubles as the
//! reference implementation.

use lutdot_common::KernelError;
use std::sync::OnceLock;

pub mod cpu;
pub mod lut;
pub mod packing;

pub use lutdot_common::{
    LutDotError, Result, LANES, QK_I2, WEIGHTS_PER_BYTE, WEIGHT_BYTES_PER_BLOCK,
};

/// Dot-product kernel provider
pub trait DotKernel: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;

    /// Compute the quantized dot product.
    ///
    /// `weights` holds packed 2-bit values (four per byte, interleaved block
    /// layout, see [`packing`]); `activations` holds one `i8` per logical
    /// element. The element count must be a positive multiple of [`QK_I2`].
    /// Accumulation is exact integer arithmetic; the result is cast to `f32`
    /// at the very end.
    fn vec_dot_i2_i8(&self, weights: &[u8], activations: &[i8]) -> Result<f32>;
}

/// Kernel manager selecting the best available provider, with cached choice
pub struct KernelManager {
    providers: Vec<Box<dyn DotKernel>>,
    selected: OnceLock<usize>,
}

impl KernelManager {
    pub fn new() -> Self {
        // Fallback goes last; SIMD backends are inserted ahead of it in
        // order of preference.
        let mut providers: Vec<Box<dyn DotKernel>> =
            vec![Box::new(cpu::PortableKernel), Box::new(cpu::FallbackKernel)];

        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                providers.insert(0, Box::new(cpu::Avx2Kernel));
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                providers.insert(0, Box::new(cpu::NeonKernel));
            }
        }

        Self { providers, selected: OnceLock::new() }
    }

    /// Select the best available kernel provider with caching
    pub fn select_best(&self) -> Result<&dyn DotKernel> {
        let selected_idx = self.selected.get_or_init(|| {
            for (i, provider) in self.providers.iter().enumerate() {
                if provider.is_available() {
                    log::info!("selected kernel provider: {}", provider.name());
                    return i;
                }
            }
            log::error!("no available kernel provider found");
            self.providers.len()
        });

        match self.providers.get(*selected_idx) {
            Some(provider) => Ok(provider.as_ref()),
            None => Err(KernelError::NoProvider.into()),
        }
    }

    /// Name of the currently selected provider, if selection has run
    pub fn selected_provider_name(&self) -> Option<&'static str> {
        self.selected
            .get()
            .and_then(|&idx| self.providers.get(idx))
            .map(|provider| provider.name())
    }

    /// All providers available on this machine, in preference order
    pub fn available_providers(&self) -> Vec<&dyn DotKernel> {
        self.providers
            .iter()
            .filter(|provider| provider.is_available())
            .map(|provider| provider.as_ref())
            .collect()
    }
}

impl Default for KernelManager {
    fn default() -> Self {
        Self::new()
    }
}
