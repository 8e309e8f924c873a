//! Build directory management.
//!
//! Keeps every generated artifact of a program under one `.hotloop`
//! directory next to its entry file, so the CLI and the library agree on
//! where units are built.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory structure for a hotloop program.
///
/// ```text
/// game.rs
/// .hotloop/
/// └── build/
///     └── units/  # One mirrored and compiled directory per load
/// ```
#[derive(Debug, Clone)]
pub struct BuildDirs {
    /// The `.hotloop` directory itself.
    pub hotloop_dir: PathBuf,

    /// Build directory for compiled artifacts.
    pub build_dir: PathBuf,

    /// Parent of the per-load unit directories.
    pub units_dir: PathBuf,
}

impl BuildDirs {
    /// Create the directory structure next to an entry file.
    ///
    /// # Errors
    /// Returns an error if directory creation fails.
    pub fn from_entry_path(entry_path: &Path) -> Result<Self> {
        Self::from_dir(entry_dir(entry_path))
    }

    /// Create the directory structure inside `dir`.
    ///
    /// # Errors
    /// Returns an error if directory creation fails.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let dirs = Self::locate(dir);
        fs::create_dir_all(&dirs.units_dir)?;
        Ok(dirs)
    }

    /// The directory structure inside `dir`, without touching the disk.
    ///
    /// Anything but an existing directory is taken as the entry file and
    /// its parent is used.
    pub fn locate(dir: &Path) -> Self {
        let dir = if dir.is_dir() { dir } else { entry_dir(dir) };
        let hotloop_dir = dir.join(".hotloop");
        let build_dir = hotloop_dir.join("build");
        let units_dir = build_dir.join("units");

        Self {
            hotloop_dir,
            build_dir,
            units_dir,
        }
    }

    /// Remove the `.hotloop` directory and everything in it.
    ///
    /// Returns whether there was anything to remove.
    pub fn clean(&self) -> Result<bool> {
        if !self.hotloop_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.hotloop_dir)?;
        Ok(true)
    }
}

fn entry_dir(entry_path: &Path) -> &Path {
    entry_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
