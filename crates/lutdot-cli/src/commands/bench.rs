//! Wall-clock throughput measurement
//!
//! The original apps read hardware cycle and instruction counters around
//! each kernel; those are target-specific and out of scope here, so the
//! harness reports wall-clock time and element throughput instead. Use the
//! criterion benches in lutdot-kernels for regression-grade numbers.

use crate::exit::EXIT_SUCCESS;
use anyhow::Result;
use clap::Args;
use lutdot_kernels::{KernelManager, QK_I2, WEIGHT_BYTES_PER_BLOCK};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

#[derive(Args)]
pub struct BenchCommand {
    /// Comma-separated block counts to measure (128 elements per block)
    #[arg(long, value_delimiter = ',', default_values_t = [1usize, 8, 64, 512])]
    blocks: Vec<usize>,

    /// RNG seed for input generation
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl BenchCommand {
    pub fn execute(self) -> Result<i32> {
        let manager = KernelManager::new();
        let providers = manager.available_providers();
        let mut rng = StdRng::seed_from_u64(self.seed);

        println!("{:<10} {:>10} {:>12} {:>12}", "backend", "elements", "ns/call", "Melem/s");

        for &blocks in &self.blocks {
            let n = blocks * QK_I2;
            let weights: Vec<u8> =
                (0..blocks * WEIGHT_BYTES_PER_BLOCK).map(|_| rng.gen()).collect();
            let activations: Vec<i8> = (0..n).map(|_| rng.gen()).collect();

            for kernel in &providers {
                // Size the iteration count so each measurement covers at
                // least a few milliseconds.
                let iters = (1_000_000 / n).max(16);

                // Warm-up pass also keeps the result observable.
                let mut sink = kernel.vec_dot_i2_i8(&weights, &activations)?;

                let start = Instant::now();
                for _ in 0..iters {
                    sink += kernel.vec_dot_i2_i8(&weights, &activations)?;
                }
                let elapsed = start.elapsed();

                let ns_per_call = elapsed.as_nanos() as f64 / iters as f64;
                let melem_s = n as f64 / ns_per_call * 1_000.0;
                println!(
                    "{:<10} {:>10} {:>12.1} {:>12.1}",
                    kernel.name(),
                    n,
                    ns_per_call,
                    melem_s,
                );
                std::hint::black_box(sink);
            }
        }

        Ok(EXIT_SUCCESS)
    }
}
