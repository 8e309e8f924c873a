//! Run command implementation for hotloop CLI.
//!
//! Compiles the program into units and keeps it running through edits
//! until it quits or the tick limit is reached.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hotloop_core::{
    BuildConfig, BuildDirs, DylibBackend, ExitReason, ExternCrate, HeadlessPlatform, LoopConfig,
    ProgramLoader, ReloadLoop, ToolchainManager, UnitCompiler,
};

use crate::colors;

/// Options collected from the command line.
pub struct RunOptions {
    pub fps: Option<u32>,
    pub check_interval: u64,
    pub poll_ms: u64,
    pub max_ticks: Option<u64>,
    pub externs: Vec<ExternCrate>,
    pub search_paths: Vec<PathBuf>,
    pub release: bool,
    pub keep_units: bool,
}

/// Run a program.
pub fn execute(entry: &Path, options: RunOptions) -> anyhow::Result<()> {
    let start = Instant::now();

    if !entry.is_file() {
        anyhow::bail!("Entry file not found: {}", entry.display());
    }

    let toolchain = ToolchainManager::new()?;
    println!(
        "\n{}Running{} {} {}({}){}",
        colors::BOLD,
        colors::RESET,
        entry.display(),
        colors::DIM,
        toolchain.version(),
        colors::RESET
    );

    let dirs = BuildDirs::from_entry_path(entry)?;
    let config = build_config(&dirs, &options);
    let loader = ProgramLoader::new(DylibBackend::new(UnitCompiler::new(config, toolchain)));

    let loop_config = LoopConfig {
        fps: options.fps,
        check_interval: options.check_interval,
        recover_poll: Duration::from_millis(options.poll_ms),
        max_ticks: options.max_ticks,
    };
    let mut reload_loop = ReloadLoop::new(entry, loader, HeadlessPlatform::new(), loop_config);
    let reason = reload_loop.run()?;

    let stats = reload_loop.stats();
    let how = match reason {
        ExitReason::Quit => "Quit",
        ExitReason::TickLimit => "Stopped at tick limit",
    };
    println!("\n{}", "─".repeat(50));
    println!(
        "{}{}{} after {} ticks in {:.2}s",
        colors::GREEN,
        how,
        colors::RESET,
        stats.ticks,
        start.elapsed().as_secs_f64()
    );
    println!(
        "{}{} loads, {} reloads, {} failed loads, {} failed ticks{}",
        colors::DIM,
        stats.loads,
        stats.reloads,
        stats.failed_loads,
        stats.failed_ticks,
        colors::RESET
    );

    Ok(())
}

fn build_config(dirs: &BuildDirs, options: &RunOptions) -> BuildConfig {
    let mut config = BuildConfig::for_program(dirs);
    if options.release {
        config = config.release();
    }
    config.keep_units = options.keep_units;
    config.extern_crates.extend(options.externs.iter().cloned());
    config.search_paths.extend(options.search_paths.iter().cloned());

    if !config.has_extern("hotloop") {
        match ToolchainManager::detect_runtime() {
            Some(runtime) => config = config.with_runtime(&runtime),
            None => println!(
                "{}Warning:{} no prebuilt `hotloop` crate found; pass --extern hotloop=PATH",
                colors::YELLOW,
                colors::RESET
            ),
        }
    }
    config
}
