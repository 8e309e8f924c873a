//! Clean command implementation for hotloop CLI.

use std::path::Path;

use hotloop_core::BuildDirs;

use crate::colors;

/// Remove the `.hotloop` directory next to `path`.
pub fn execute(path: &Path) -> anyhow::Result<()> {
    let dirs = BuildDirs::locate(path);

    if dirs.clean()? {
        println!("{}Removed{} {}", colors::GREEN, colors::RESET, dirs.hotloop_dir.display());
    } else {
        println!(
            "{}Nothing to clean in {}{}",
            colors::DIM,
            dirs.hotloop_dir.display(),
            colors::RESET
        );
    }
    Ok(())
}
