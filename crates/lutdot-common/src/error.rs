//! Error types for the lutdot workspace

use thiserror::Error;

/// Top-level error type for lutdot operations
#[derive(Debug, Error)]
pub enum LutDotError {
    /// Kernel execution or selection error
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

/// Errors raised by kernel providers
#[derive(Debug, Error)]
pub enum KernelError {
    /// Caller-supplied buffers violate the kernel contract
    #[error("invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    /// The provider was invoked on hardware that does not support it
    #[error("unsupported hardware: requires {required}, detected {available}")]
    UnsupportedHardware { required: String, available: String },

    /// No kernel provider is available on this machine
    #[error("no available kernel provider")]
    NoProvider,
}

/// Result type alias used throughout the lutdot crates
pub type Result<T> = std::result::Result<T, LutDotError>;
