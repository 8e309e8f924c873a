//! Loading compiled units and the dylib backend.

use std::mem::ManuallyDrop;
use std::path::Path;

use hotloop::{ABI_VERSION, ABI_VERSION_SYMBOL, ENTRY_SYMBOL, Entry};
use libloading::{Library, Symbol};
use thiserror::Error;

use super::backend::{BuildRequest, LoadedProgram, ProgramBackend};
use super::compile::{UnitCompiler, remove_unit_dir};
use super::types::CompiledUnit;
use crate::error::{Error, Result};

type AbiVersionFn = fn() -> u32;
type EntryFn = fn() -> Entry;

/// Failures reading a unit's exports.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("failed to load {path}: {source}")]
    Library {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("missing symbol `{symbol}`: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("unit was built for ABI version {found}, expected {expected}")]
    AbiMismatch { found: u32, expected: u32 },
}

/// A unit's library, mapped into the process.
///
/// Everything built from the unit's [`Entry`] must be dropped before this.
pub struct LoadedUnit {
    compiled: CompiledUnit,
    library: ManuallyDrop<Library>,
    keep_dir: bool,
}

impl LoadedUnit {
    /// Map the compiled library.
    pub fn load(compiled: CompiledUnit, keep_dir: bool) -> std::result::Result<Self, UnitError> {
        // SAFETY: the library was just built by us from a crate that only
        // exports plain functions; it has no load-time initializers.
        let library = unsafe { Library::new(&compiled.dylib_path) }.map_err(|source| {
            UnitError::Library {
                path: compiled.dylib_path.display().to_string(),
                source,
            }
        })?;

        Ok(Self {
            compiled,
            library: ManuallyDrop::new(library),
            keep_dir,
        })
    }

    pub fn compiled(&self) -> &CompiledUnit {
        &self.compiled
    }

    pub fn dylib_path(&self) -> &Path {
        &self.compiled.dylib_path
    }

    /// Read the unit's entry table after checking its ABI version.
    pub fn entry(&self) -> std::result::Result<Entry, UnitError> {
        let library: &Library = &self.library;

        // SAFETY: the symbol types match the export block generated for
        // every unit, and the ABI version is checked before the entry table
        // is touched.
        let version: Symbol<AbiVersionFn> = unsafe { library.get(ABI_VERSION_SYMBOL.as_bytes()) }
            .map_err(|source| UnitError::MissingSymbol {
                symbol: ABI_VERSION_SYMBOL,
                source,
            })?;
        check_abi(version())?;

        let entry: Symbol<EntryFn> = unsafe { library.get(ENTRY_SYMBOL.as_bytes()) }.map_err(
            |source| UnitError::MissingSymbol {
                symbol: ENTRY_SYMBOL,
                source,
            },
        )?;
        Ok(entry())
    }
}

fn check_abi(found: u32) -> std::result::Result<(), UnitError> {
    if found != ABI_VERSION {
        return Err(UnitError::AbiMismatch {
            found,
            expected: ABI_VERSION,
        });
    }
    Ok(())
}

impl Drop for LoadedUnit {
    fn drop(&mut self) {
        // Unload before deleting so platforms that lock mapped files allow it.
        // SAFETY: `library` is not used after this point.
        unsafe { ManuallyDrop::drop(&mut self.library) };
        if !self.keep_dir {
            remove_unit_dir(&self.compiled.unit_dir);
        }
    }
}

impl std::fmt::Debug for LoadedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedUnit")
            .field("program", &self.compiled.program)
            .field("dylib_path", &self.compiled.dylib_path)
            .finish()
    }
}

/// Builds programs by compiling each load into its own unit.
pub struct DylibBackend {
    compiler: UnitCompiler,
}

impl DylibBackend {
    pub fn new(compiler: UnitCompiler) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &UnitCompiler {
        &self.compiler
    }
}

impl ProgramBackend for DylibBackend {
    fn name(&self) -> &'static str {
        "dylib"
    }

    fn build(&mut self, request: &BuildRequest<'_>) -> Result<LoadedProgram> {
        let program = &request.program.name;

        let compiled = self
            .compiler
            .compile(request)
            .map_err(|e| Error::load_failure(program, e))?;
        tracing::info!(
            "Compiled `{}` in {} ms",
            program,
            compiled.compile_time_ms
        );

        let unit = LoadedUnit::load(compiled, self.compiler.config().keep_units)
            .map_err(|e| Error::load_failure(program, e))?;
        let entry = unit.entry().map_err(|e| Error::load_failure(program, e))?;

        Ok(LoadedProgram {
            entry,
            unit: Some(unit),
        })
    }
}
