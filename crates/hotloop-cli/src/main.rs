//! hotloop CLI - Run game loops with live code reloading.

mod check;
mod clean;
mod colors;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hotloop_core::ExternCrate;

#[derive(Parser)]
#[command(name = "hotloop")]
#[command(about = "Run game loops with live code reloading")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program and reload it whenever its files change
    Run {
        /// Path to the entry file (.rs)
        entry: PathBuf,

        /// Target ticks per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Run as fast as possible
        #[arg(long, conflicts_with = "fps")]
        unpaced: bool,

        /// Ticks between checks for file changes
        #[arg(long, default_value = "60")]
        check_interval: u64,

        /// Milliseconds between checks while waiting for a fix
        #[arg(long, default_value = "2000")]
        poll_ms: u64,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Extra crate for the program, as NAME=PATH
        #[arg(long = "extern", value_name = "NAME=PATH")]
        externs: Vec<ExternCrate>,

        /// Extra library search path
        #[arg(short = 'L', value_name = "DIR")]
        search_paths: Vec<PathBuf>,

        /// Build units with optimizations
        #[arg(long)]
        release: bool,

        /// Keep unit directories after unloading them
        #[arg(long)]
        keep_units: bool,
    },

    /// Check that a program can be loaded, without building it
    Check {
        /// Path to the entry file (.rs)
        entry: PathBuf,
    },

    /// Remove the build artifacts next to a program
    Clean {
        /// Path to the entry file or its directory
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Show the whole cause chain for engine errors
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        match err.downcast_ref::<hotloop_core::Error>() {
            Some(core_err) => anyhow::anyhow!("{}", core_err.report()),
            None => err,
        }
    };

    match cli.command {
        Commands::Run {
            entry,
            fps,
            unpaced,
            check_interval,
            poll_ms,
            max_ticks,
            externs,
            search_paths,
            release,
            keep_units,
        } => {
            let options = run::RunOptions {
                fps: (!unpaced).then_some(fps),
                check_interval,
                poll_ms,
                max_ticks,
                externs,
                search_paths,
                release,
                keep_units,
            };
            run::execute(&entry, options).map_err(format_error)?;
        }

        Commands::Check { entry } => {
            check::execute(&entry).map_err(format_error)?;
        }

        Commands::Clean { path } => {
            clean::execute(&path).map_err(format_error)?;
        }
    }

    Ok(())
}
