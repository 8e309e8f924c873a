//! Toolchain management for unit compilation.
//!
//! Locates `rustc` and the prebuilt `hotloop` crate that units link against.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use super::types::RuntimeLibs;
use crate::error::{Error, Result};

/// Manages the Rust toolchain used to build units.
#[derive(Debug, Clone)]
pub struct ToolchainManager {
    /// Path to rustc
    rustc_path: PathBuf,

    /// Toolchain version string
    version: String,
}

impl ToolchainManager {
    /// Create a new toolchain manager using the `rustc` found in PATH.
    pub fn new() -> Result<Self> {
        let rustc_path = Self::find_rustc()?;
        Self::with_rustc(rustc_path)
    }

    /// Use a specific `rustc` binary.
    pub fn with_rustc(rustc_path: impl Into<PathBuf>) -> Result<Self> {
        let rustc_path = rustc_path.into();
        let version = Self::get_rustc_version(&rustc_path)?;
        Ok(Self {
            rustc_path,
            version,
        })
    }

    /// Get the rustc path.
    pub fn rustc_path(&self) -> &Path {
        &self.rustc_path
    }

    /// Get the toolchain version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Find the `hotloop` rlib built alongside the running executable.
    ///
    /// Cargo places it in `target/<profile>/deps`; binaries live one level
    /// above, test binaries inside.
    pub fn detect_runtime() -> Option<RuntimeLibs> {
        let exe = std::env::current_exe().ok()?;
        let exe_dir = exe.parent()?;
        find_runtime_in(&[exe_dir.join("deps"), exe_dir.to_path_buf()])
    }

    /// Find rustc in PATH.
    fn find_rustc() -> Result<PathBuf> {
        which::which("rustc").map_err(|_| Error::Toolchain("rustc not found in PATH".to_string()))
    }

    /// Get rustc version string.
    fn get_rustc_version(rustc: &Path) -> Result<String> {
        let output = Command::new(rustc)
            .arg("--version")
            .output()
            .map_err(|e| Error::Toolchain(format!("Failed to run rustc: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Toolchain("Failed to get rustc version".to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Newest `libhotloop[-hash].rlib` in the first directory that has one.
pub fn find_runtime_in(dirs: &[PathBuf]) -> Option<RuntimeLibs> {
    dirs.iter().find_map(|dir| {
        let hotloop_rlib = newest_hotloop_rlib(dir)?;
        let deps_dir = if dir.ends_with("deps") || !dir.join("deps").is_dir() {
            dir.clone()
        } else {
            dir.join("deps")
        };
        Some(RuntimeLibs {
            hotloop_rlib,
            deps_dir,
        })
    })
}

fn newest_hotloop_rlib(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_hotloop_rlib(path))
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
}

fn is_hotloop_rlib(path: &Path) -> bool {
    if path.extension().is_none_or(|e| e != "rlib") {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    match stem.strip_prefix("libhotloop") {
        Some(rest) => rest.is_empty() || rest.starts_with('-'),
        None => false,
    }
}
