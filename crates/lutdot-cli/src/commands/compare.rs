//! Randomized scalar/vector comparison
//!
//! Draws `pairs` random (weights, activations) cases and requires every
//! available backend to agree exactly with the scalar reference. Agreement
//! is integer-exact; the float cast happens after accumulation in both
//! paths.

use crate::exit::{exit_code_for_index, EXIT_SUCCESS};
use anyhow::Result;
use clap::Args;
use console::style;
use lutdot_kernels::cpu::vec_dot_i2_i8_ref;
use lutdot_kernels::{KernelManager, QK_I2, WEIGHT_BYTES_PER_BLOCK};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

#[derive(Args)]
pub struct CompareCommand {
    /// Number of randomized cases per backend
    #[arg(long, default_value_t = 1000)]
    pairs: usize,

    /// Blocks of 128 elements per case
    #[arg(long, default_value_t = 1)]
    blocks: usize,

    /// RNG seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl CompareCommand {
    pub fn execute(self) -> Result<i32> {
        let manager = KernelManager::new();
        let providers = manager.available_providers();

        let mut case = 0usize;
        let mut first_failure: Option<usize> = None;

        for kernel in providers {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let mut mismatches = 0usize;

            for _ in 0..self.pairs {
                let weights: Vec<u8> =
                    (0..self.blocks * WEIGHT_BYTES_PER_BLOCK).map(|_| rng.gen()).collect();
                let activations: Vec<i8> =
                    (0..self.blocks * QK_I2).map(|_| rng.gen()).collect();

                let expected = vec_dot_i2_i8_ref(&weights, &activations)?;
                let got = kernel.vec_dot_i2_i8(&weights, &activations)?;
                if got != expected {
                    info!(
                        case,
                        got = got as f64,
                        expected = expected as f64,
                        backend = kernel.name(),
                        "mismatch"
                    );
                    mismatches += 1;
                    first_failure.get_or_insert(case);
                }
                case += 1;
            }

            if mismatches == 0 {
                println!(
                    "{}: {}. All {} results match the scalar reference.",
                    kernel.name(),
                    style("Passed").green(),
                    self.pairs,
                );
            } else {
                println!(
                    "{}: {}. {mismatches} of {} results differ from the scalar reference.",
                    kernel.name(),
                    style("Failed").red(),
                    self.pairs,
                );
            }
        }

        match first_failure {
            None => Ok(EXIT_SUCCESS),
            Some(index) => {
                println!("{}", style(format!("First failing case: {index}.")).red());
                Ok(exit_code_for_index(index))
            }
        }
    }
}
