//! Fixed verification scenarios
//!
//! Each scenario has a known expected dot product; every available backend
//! must match it exactly, and additionally agree with the scalar reference.
//! One pass/fail line is printed per (backend, scenario) pair.

use crate::exit::{exit_code_for_index, EXIT_SUCCESS};
use anyhow::Result;
use clap::Args;
use console::style;
use lutdot_kernels::cpu::vec_dot_i2_i8_ref;
use lutdot_kernels::{KernelManager, QK_I2, WEIGHT_BYTES_PER_BLOCK};
use tracing::debug;

#[derive(Args)]
pub struct VerifyCommand {}

struct Scenario {
    name: &'static str,
    weights: Vec<u8>,
    activations: Vec<i8>,
    expected: f32,
}

fn scenarios() -> Vec<Scenario> {
    let mut list = Vec::new();

    // Literal scenario from the original benchmark harness.
    let mut weights = vec![0b1010_1010u8; WEIGHT_BYTES_PER_BLOCK];
    weights[2] = 0b1111_1111;
    weights[18] = 0b1111_1111;
    let mut activations = vec![0i8; QK_I2];
    for i in (2..QK_I2).step_by(16) {
        activations[i] = -128;
    }
    list.push(Scenario { name: "harness pattern", weights, activations, expected: -3072.0 });

    list.push(Scenario {
        name: "zero weights",
        weights: vec![0u8; WEIGHT_BYTES_PER_BLOCK],
        activations: (0..QK_I2).map(|i| (i as u8).wrapping_mul(7) as i8).collect(),
        expected: 0.0,
    });

    list.push(Scenario {
        name: "zero activations",
        weights: (0..WEIGHT_BYTES_PER_BLOCK).map(|i| (i * 31 + 3) as u8).collect(),
        activations: vec![0i8; QK_I2],
        expected: 0.0,
    });

    list.push(Scenario {
        name: "saturated weights, unit activations",
        weights: vec![0xFFu8; WEIGHT_BYTES_PER_BLOCK],
        activations: vec![1i8; QK_I2],
        expected: (3 * QK_I2) as f32,
    });

    // Weight 1 in bits [7:6] of byte 0 pairs with activation index 0.
    let mut weights = vec![0u8; WEIGHT_BYTES_PER_BLOCK];
    weights[0] = 0b0100_0000;
    let mut activations = vec![0i8; QK_I2];
    activations[0] = -128;
    list.push(Scenario { name: "sign bit isolation", weights, activations, expected: -128.0 });

    list
}

impl VerifyCommand {
    pub fn execute(self) -> Result<i32> {
        let manager = KernelManager::new();
        let providers = manager.available_providers();
        let scenarios = scenarios();

        let mut case = 0usize;
        let mut first_failure: Option<usize> = None;

        for kernel in providers {
            println!("=== backend: {} ===", kernel.name());
            for scenario in &scenarios {
                let reference = vec_dot_i2_i8_ref(&scenario.weights, &scenario.activations)?;
                debug!(scenario = scenario.name, reference = reference as f64, "scalar reference computed");

                let outcome = kernel.vec_dot_i2_i8(&scenario.weights, &scenario.activations);
                let ok = match &outcome {
                    Ok(got) => *got == scenario.expected && *got == reference,
                    Err(_) => false,
                };

                if ok {
                    println!(
                        "{}: {}. Result matches the expected value ({}).",
                        scenario.name,
                        style("Passed").green(),
                        scenario.expected,
                    );
                } else {
                    println!(
                        "{}: {} at case {case}: got {:?}, expected {}.",
                        scenario.name,
                        style("Failed").red(),
                        outcome,
                        scenario.expected,
                    );
                    first_failure.get_or_insert(case);
                }
                case += 1;
            }
        }

        match first_failure {
            None => {
                println!("{}", style("All verification stages passed.").green());
                Ok(EXIT_SUCCESS)
            }
            Some(index) => {
                println!("{}", style(format!("First failing case: {index}.")).red());
                Ok(exit_code_for_index(index))
            }
        }
    }
}
