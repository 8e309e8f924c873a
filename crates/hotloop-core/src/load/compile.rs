//! Unit compiler.
//!
//! Mirrors the tracked files into a fresh unit directory and compiles the
//! mirrored entry into a dynamic library with `rustc`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use uuid::Uuid;

use super::backend::BuildRequest;
use super::diagnostics::{CompileError, CompileFailure, ErrorMapper};
use super::source_processor::UnitSourceProcessor;
use super::toolchain::ToolchainManager;
use super::types::{BuildConfig, CompiledUnit, dylib_extension, dylib_prefix};

/// A unit directory with its sources written, ready for rustc.
#[derive(Debug, Clone)]
pub struct PreparedUnit {
    pub id: Uuid,
    pub unit_dir: PathBuf,
    /// Crate root: the mirrored entry.
    pub root: PathBuf,
    /// Original directory the mirror is rooted at.
    pub original_root: PathBuf,
    pub dylib_path: PathBuf,
}

impl PreparedUnit {
    /// Crate name rustc is given; unique per unit.
    pub fn crate_name(&self) -> String {
        format!("hotloop_unit_{}", short_id(&self.id))
    }
}

fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..12].to_string()
}

/// Compiles programs into loadable units.
pub struct UnitCompiler {
    /// Build configuration
    config: BuildConfig,

    /// Toolchain manager
    toolchain: ToolchainManager,
}

impl UnitCompiler {
    /// Create a new unit compiler.
    pub fn new(config: BuildConfig, toolchain: ToolchainManager) -> Self {
        if !config.has_extern("hotloop") {
            tracing::warn!(
                "No `hotloop` crate configured for units; programs using it will not compile"
            );
        }
        Self { config, toolchain }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &ToolchainManager {
        &self.toolchain
    }

    /// Compile `request` into a fresh unit.
    pub fn compile(&self, request: &BuildRequest<'_>) -> Result<CompiledUnit, CompileFailure> {
        let start = Instant::now();

        let prepared = prepare_unit(&self.config.units_dir, request).map_err(|e| {
            CompileFailure {
                errors: vec![CompileError::simple(format!(
                    "Failed to prepare unit directory: {}",
                    e
                ))],
            }
        })?;

        tracing::debug!(
            "Compiling `{}` in {}",
            request.program.name,
            prepared.unit_dir.display()
        );

        match self.run_rustc(&prepared) {
            Ok(()) => Ok(CompiledUnit {
                id: prepared.id,
                program: request.program.name.clone(),
                unit_dir: prepared.unit_dir,
                dylib_path: prepared.dylib_path,
                compile_time_ms: start.elapsed().as_millis() as u64,
            }),
            Err(errors) => {
                if !self.config.keep_units {
                    remove_unit_dir(&prepared.unit_dir);
                }
                Err(CompileFailure { errors })
            }
        }
    }

    /// The rustc invocation for a prepared unit.
    pub fn command(&self, prepared: &PreparedUnit) -> Command {
        let mut cmd = Command::new(self.toolchain.rustc_path());

        cmd.arg(&prepared.root)
            .arg("--crate-type=cdylib")
            .arg(format!("--crate-name={}", prepared.crate_name()))
            .arg(format!("--edition={}", self.config.edition))
            .arg("-o")
            .arg(&prepared.dylib_path)
            .arg("--error-format=json");

        // Optimization level
        cmd.arg(format!("-Copt-level={}", self.config.opt_level));

        // Debug info
        if self.config.debug_info {
            cmd.arg("-g");
        }

        for path in &self.config.search_paths {
            cmd.arg("-L").arg(format!("dependency={}", path.display()));
        }

        for krate in &self.config.extern_crates {
            cmd.arg("--extern")
                .arg(format!("{}={}", krate.name, krate.path.display()));
        }

        // Extra flags
        for flag in &self.config.extra_rustc_flags {
            cmd.arg(flag);
        }

        cmd
    }

    fn run_rustc(&self, prepared: &PreparedUnit) -> Result<(), Vec<CompileError>> {
        let output = self
            .command(prepared)
            .output()
            .map_err(|e| vec![CompileError::simple(format!("Failed to run rustc: {}", e))])?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mapper = ErrorMapper::new(CompiledUnit::src_dir(&prepared.unit_dir), &prepared.original_root);
        let errors = mapper.parse_rustc_output(&stderr);

        if errors.is_empty() {
            // Fallback if JSON parsing failed
            Err(vec![CompileError::simple_rendered(stderr.to_string())])
        } else {
            Err(errors)
        }
    }
}

/// Create a unit directory under `units_dir` and mirror the request into it.
///
/// Every tracked file is copied to the same path relative to the set's
/// common root; the entry is written in its processed form.
pub fn prepare_unit(units_dir: &Path, request: &BuildRequest<'_>) -> io::Result<PreparedUnit> {
    let id = Uuid::new_v4();
    let unit_dir = units_dir.join(id.to_string());
    let src_dir = CompiledUnit::src_dir(&unit_dir);
    let original_root = request.deps.common_root();

    let mut root = None;
    for file in request.deps {
        let relative = file.path().strip_prefix(&original_root).map_err(|_| {
            io::Error::other(format!(
                "{} is outside {}",
                file.path().display(),
                original_root.display()
            ))
        })?;
        let target = src_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if file.path() == request.deps.entry().path() {
            let processed =
                UnitSourceProcessor::process_root(request.entry_source, request.entry_ast, request.program);
            fs::write(&target, processed)?;
            root = Some(target);
        } else {
            fs::copy(file.path(), &target)?;
        }
    }

    let root = root.ok_or_else(|| io::Error::other("entry file missing from dependency set"))?;
    let dylib_path = unit_dir.join(format!(
        "{}hotloop_unit_{}.{}",
        dylib_prefix(),
        short_id(&id),
        dylib_extension()
    ));

    Ok(PreparedUnit {
        id,
        unit_dir,
        root,
        original_root,
        dylib_path,
    })
}

pub(crate) fn remove_unit_dir(unit_dir: &Path) {
    if let Err(e) = fs::remove_dir_all(unit_dir) {
        tracing::warn!("Failed to remove unit {}: {}", unit_dir.display(), e);
    }
}
