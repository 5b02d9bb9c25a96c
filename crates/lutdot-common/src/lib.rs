//! Common types and utilities for the lutdot kernels
//!
//! This crate provides the foundational pieces shared across the lutdot
//! workspace: the error taxonomy, the shared `Result` alias, and the
//! quantized block-format constants.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
