//! Loading pipeline for hotloop programs.
//!
//! This module provides:
//! - Program location (`impl Program for T` in the entry file)
//! - Backends turning a located program into an entry table
//! - Unit compilation (tracked files → mirrored unit → dylib)
//! - Error mapping (rustc diagnostics → original files)
//! - The loader tying it together
//!
//! # Architecture
//!
//! ```text
//! entry.rs ──► SourceFile ──► DependencyDiscoverer ──► DependencySet
//!     │
//!     └── locate_program ──► ProgramDecl
//!                                │
//!                      ProgramBackend::build
//!                      ├── DylibBackend: UnitCompiler ──► units/<uuid>/*.so ──► LoadedUnit
//!                      └── ProgramRegistry: registered Entry
//!                                │
//!                         Entry::construct / resume ──► ProgramInstance
//! ```

mod backend;
mod compile;
mod diagnostics;
mod dylib;
mod loader;
mod locate;
mod registry;
mod source_processor;
mod toolchain;
mod types;

pub use backend::{BuildRequest, LoadedProgram, ProgramBackend};
pub use compile::{PreparedUnit, UnitCompiler, prepare_unit};
pub use diagnostics::{CompileError, CompileFailure, ErrorLevel, ErrorMapper, SourceLocation};
pub use dylib::{DylibBackend, LoadedUnit, UnitError};
pub use loader::{Inspection, Loaded, ProgramLoader, inspect};
pub use locate::{PROGRAM_TRAIT, ProgramDecl, locate_all, locate_program};
pub use registry::ProgramRegistry;
pub use source_processor::UnitSourceProcessor;
pub use toolchain::{ToolchainManager, find_runtime_in};
pub use types::{
    BuildConfig, CompiledUnit, ExternCrate, RuntimeLibs, dylib_extension, dylib_prefix,
};
