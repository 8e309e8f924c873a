//! Common types for the unit build pipeline.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use uuid::Uuid;

use crate::paths::BuildDirs;

/// Configuration for the unit compiler.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Parent of the per-load unit directories (.hotloop/build/units/)
    pub units_dir: PathBuf,

    /// Rust edition the program is written in
    pub edition: String,

    /// Optimization level (0-3)
    pub opt_level: u8,

    /// Emit debug info
    pub debug_info: bool,

    /// Crates passed with `--extern`
    pub extern_crates: Vec<ExternCrate>,

    /// Library search paths passed with `-L`
    pub search_paths: Vec<PathBuf>,

    /// Additional rustc flags
    pub extra_rustc_flags: Vec<String>,

    /// Keep unit directories after their library is unloaded
    pub keep_units: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            units_dir: PathBuf::from(".hotloop/build/units"),
            edition: "2021".to_string(),
            opt_level: 0,
            debug_info: true,
            extern_crates: Vec::new(),
            search_paths: Vec::new(),
            extra_rustc_flags: Vec::new(),
            keep_units: false,
        }
    }
}

impl BuildConfig {
    /// Create a development config with paths from [`BuildDirs`].
    pub fn for_program(dirs: &BuildDirs) -> Self {
        Self {
            units_dir: dirs.units_dir.clone(),
            ..Self::default()
        }
    }

    /// Switch to optimized builds without debug info.
    pub fn release(mut self) -> Self {
        self.opt_level = 3;
        self.debug_info = false;
        self
    }

    /// Link units against the given `hotloop` runtime.
    pub fn with_runtime(mut self, runtime: &RuntimeLibs) -> Self {
        self.extern_crates.push(ExternCrate {
            name: "hotloop".to_string(),
            path: runtime.hotloop_rlib.clone(),
        });
        self.search_paths.push(runtime.deps_dir.clone());
        self
    }

    /// Whether a crate named `name` is passed with `--extern`.
    pub fn has_extern(&self, name: &str) -> bool {
        self.extern_crates.iter().any(|c| c.name == name)
    }
}

/// A crate handed to rustc with `--extern name=path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternCrate {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for ExternCrate {
    type Err = String;

    /// Parse the `name=path` form rustc accepts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=PATH, got `{s}`"))?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid crate name `{name}`"));
        }
        if path.is_empty() {
            return Err(format!("missing path for crate `{name}`"));
        }
        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(path),
        })
    }
}

/// Location of the prebuilt `hotloop` crate units link against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLibs {
    /// `libhotloop-<hash>.rlib`
    pub hotloop_rlib: PathBuf,

    /// Directory holding the rlibs of its dependencies
    pub deps_dir: PathBuf,
}

/// Result of compiling one unit.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Unique id; also names the unit directory
    pub id: Uuid,

    /// Name of the program type the unit exports
    pub program: String,

    /// Directory holding the mirrored sources and the library
    pub unit_dir: PathBuf,

    /// Path to the compiled dynamic library
    pub dylib_path: PathBuf,

    /// Compilation time in milliseconds
    pub compile_time_ms: u64,
}

impl CompiledUnit {
    /// Directory mirrored sources are written to.
    pub fn src_dir(unit_dir: &Path) -> PathBuf {
        unit_dir.join("src")
    }
}

/// Platform-specific dynamic library extension.
pub fn dylib_extension() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "dll"
    }
    #[cfg(target_os = "macos")]
    {
        "dylib"
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        "so"
    }
}

/// Platform-specific dynamic library prefix.
pub fn dylib_prefix() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        ""
    }
    #[cfg(not(target_os = "windows"))]
    {
        "lib"
    }
}
