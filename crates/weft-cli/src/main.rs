//! weft CLI: simulation, benchmarking and debugging.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about = "weft: spring-mass cloth simulation on CPU and GPU")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a run file.
    Simulate {
        /// Path to the run file (TOML).
        #[arg(short, long, default_value = "simulation.toml")]
        config: String,

        /// Override the backend (cpu, gpu_fallback, wgpu).
        #[arg(short, long)]
        backend: Option<String>,

        /// Override the tick count.
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Override the episode count.
        #[arg(short, long)]
        episodes: Option<u32>,
    },

    /// Run the benchmark suite.
    Benchmark {
        /// Scenario to run (sphere_drape, table_drape, grab, pile, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Backend (cpu, gpu_fallback, wgpu).
        #[arg(short, long, default_value = "cpu")]
        backend: String,

        /// Override each scenario's tick count.
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect a node snapshot (.bin) or a recording (.json).
    Inspect {
        path: String,

        /// Run file the recording was made from; replays its frames.
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Validate a run file.
    Validate {
        path: String,
    },

    /// Print a default run file.
    Config {
        /// Physics preset (default, stiff, soft).
        #[arg(short, long)]
        preset: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Simulate {
            config,
            backend,
            ticks,
            episodes,
        } => commands::simulate(&config, backend.as_deref(), ticks, episodes, cli.verbose),
        Commands::Benchmark {
            scenario,
            backend,
            ticks,
            output,
        } => commands::benchmark(&scenario, &backend, ticks, output.as_deref()),
        Commands::Inspect { path, config } => commands::inspect(&path, config.as_deref()),
        Commands::Validate { path } => commands::validate(&path),
        Commands::Config { preset } => commands::print_config(preset.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
