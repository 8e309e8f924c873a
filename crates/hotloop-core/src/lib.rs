//! Hot-reload engine for hotloop programs.
//!
//! This crate provides:
//! - Source tracking: module discovery and polling change detection
//! - Loading: program location, unit compilation and dylib loading
//! - Runtime: the reload loop with its recovery state machine
//!
//! A program is a Rust entry file plus the modules it declares. While the
//! [`ReloadLoop`] runs it, any edit to one of those files rebuilds the
//! program and swaps the running instance for a new one, handing over the
//! surface. Broken edits park the loop until the next edit.
//!
//! ```no_run
//! use hotloop_core::{HeadlessPlatform, LoopConfig, ProgramRegistry, ProgramLoader, ReloadLoop};
//! # use hotloop::prelude::*;
//! # struct Game;
//! # impl Program for Game {
//! #     fn new() -> Self { Game }
//! #     fn update(&mut self, _: &Frame<'_>) -> UpdateResult { Ok(None) }
//! # }
//!
//! let loader = ProgramLoader::new(ProgramRegistry::new().with::<Game>("Game"));
//! let mut reload_loop =
//!     ReloadLoop::new("src/game.rs", loader, HeadlessPlatform::new(), LoopConfig::default());
//! reload_loop.run()?;
//! # Ok::<(), hotloop_core::Error>(())
//! ```

pub mod error;
pub mod load;
pub mod paths;
pub mod runtime;
pub mod source;

use std::path::Path;

pub use error::{Error, Result};
pub use load::{
    BuildConfig, DylibBackend, ExternCrate, Inspection, ProgramBackend, ProgramDecl, ProgramLoader,
    ProgramRegistry, ToolchainManager, UnitCompiler, inspect,
};
pub use paths::BuildDirs;
pub use runtime::{
    ExitReason, HeadlessPlatform, LoopConfig, LoopStats, Platform, ProgramInstance, ReloadLoop,
    ReloadState, carry_over,
};
pub use source::{ChangeDetector, DependencyDiscoverer, DependencySet, FileStamp, SourceFile};

/// A loader compiling the program next to `entry` into units.
///
/// Units are built under `.hotloop/` beside the entry and linked against
/// the `hotloop` crate found next to the running executable.
pub fn dylib_loader(entry: &Path) -> Result<ProgramLoader> {
    let dirs = BuildDirs::from_entry_path(entry)?;
    let mut config = BuildConfig::for_program(&dirs);
    match ToolchainManager::detect_runtime() {
        Some(runtime) => config = config.with_runtime(&runtime),
        None => tracing::warn!("Could not find a prebuilt `hotloop` crate next to the executable"),
    }

    let compiler = UnitCompiler::new(config, ToolchainManager::new()?);
    Ok(ProgramLoader::new(DylibBackend::new(compiler)))
}

/// Run the program at `entry` headlessly with default settings.
///
/// Meant to be called from the program's own `main`; the loader blanks
/// `main` out of every unit it builds.
pub fn run(entry: impl AsRef<Path>) -> Result<ExitReason> {
    let entry = entry.as_ref();
    let loader = dylib_loader(entry)?;
    ReloadLoop::new(entry, loader, HeadlessPlatform::new(), LoopConfig::default()).run()
}
