//! BusyDB CLI
//!
//! Command-line tools that exercise an in-process BusyDB store.
//!
//! # Commands
//!
//! - `scenario` - Run the login scenario and print the resulting tables
//! - `stress` - Upsert from several threads and verify the ids
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// BusyDB command-line tools.
#[derive(Parser)]
#[command(name = "busydb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the login scenario against a fresh store
    Scenario {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Upsert users from several threads and verify ids and counts
    Stress {
        /// Number of threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Records upserted by each thread
        #[arg(short, long, default_value = "1000")]
        records: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Scenario { format } => {
            commands::scenario::run(format.parse()?)?;
        }
        Commands::Stress {
            threads,
            records,
            format,
        } => {
            commands::stress::run(threads, records, format.parse()?)?;
        }
        Commands::Version => {
            println!("BusyDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("BusyDB Core v{}", busydb_core::VERSION);
        }
    }

    Ok(())
}
