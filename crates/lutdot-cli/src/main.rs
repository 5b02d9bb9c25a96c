//! lutdot harness
//!
//! Command-line harness around the lutdot kernels: fixed verification
//! scenarios, randomized scalar/vector comparison, and wall-clock
//! throughput measurement.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit;

use commands::{BenchCommand, CompareCommand, VerifyCommand};

/// lutdot - quantized dot-product kernel harness
#[derive(Parser)]
#[command(name = "lutdot")]
#[command(about = "Verification and benchmark harness for the lutdot kernels")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fixed verification scenarios on every available backend
    Verify(VerifyCommand),
    /// Compare the bit-sliced kernels against the scalar reference on
    /// randomized inputs
    Compare(CompareCommand),
    /// Measure kernel throughput with wall-clock timing
    Bench(BenchCommand),
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Verify(cmd) => cmd.execute(),
        Commands::Compare(cmd) => cmd.execute(),
        Commands::Bench(cmd) => cmd.execute(),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(exit::EXIT_GENERIC_FAIL);
        }
    }
}
