//! Harness subcommands

pub mod bench;
pub mod compare;
pub mod verify;

pub use bench::BenchCommand;
pub use compare::CompareCommand;
pub use verify::VerifyCommand;
