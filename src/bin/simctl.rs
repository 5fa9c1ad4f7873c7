//! Thin CLI driver. Stands in for the interactive menu/REPL that stays out
//! of scope for the core: load a config, build a `Kernel`, run either a
//! fixed number of ticks or the producer/consumer demo, print a snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kernelsim::config::SimConfig;
use kernelsim::kernel::Kernel;
use kernelsim::{demos, logging};

#[derive(Parser)]
#[command(name = "simctl", about = "Discrete-time OS kernel simulator driver")]
struct Cli {
    /// Path to a TOML config file with `[memory]`, `[simulation]`, and
    /// `[logs]` sections.
    #[arg(short, long, default_value = "simulator.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Advance the simulator a fixed number of ticks with no workload.
    Run {
        #[arg(short, long, default_value_t = 10)]
        ticks: u64,
    },
    /// Run the bounded-buffer producer/consumer demo.
    ProducerConsumer {
        #[arg(long, default_value_t = 5)]
        buffer_size: usize,
        #[arg(long, default_value_t = 10)]
        items: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SimConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("could not load {}: {err}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.logs.enable_logs, &config.logs.log_file);

    let mut kernel = Kernel::new(&config);

    match cli.command {
        Command::Run { ticks } => {
            for _ in 0..ticks {
                kernel.tick();
            }
        }
        Command::ProducerConsumer { buffer_size, items } => {
            let outcome = demos::producer_consumer(&mut kernel, buffer_size, items);
            println!(
                "producer {} produced {} item(s); consumer {} consumed {} item(s)",
                outcome.producer, outcome.items_produced, outcome.consumer, outcome.items_consumed
            );
        }
    }

    kernel.finish();
    let snapshot = kernel.snapshot();
    println!("{snapshot:#?}");

    ExitCode::SUCCESS
}
