//! Check command implementation for hotloop CLI.
//!
//! Runs every load step that needs no toolchain: validation, module
//! discovery and program location.

use std::path::Path;

use crate::colors;

/// Check a program.
pub fn execute(entry: &Path) -> anyhow::Result<()> {
    println!("\n{}Checking{} {}", colors::BOLD, colors::RESET, entry.display());

    let inspection = hotloop_core::inspect(entry)?;
    let program = &inspection.program;
    let root = inspection.deps.common_root();

    println!(
        "\n{}Program:{} {}{}{} (line {})",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        program.name,
        colors::RESET,
        program.line
    );
    if program.continuation {
        println!("{}Continues from the previous instance on reload{}", colors::DIM, colors::RESET);
    }

    println!("\n{}Files:{}", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));
    for file in &inspection.deps {
        let shown = file.path().strip_prefix(&root).unwrap_or(file.path());
        println!(
            "  {} {}{}{}",
            shown.display(),
            colors::DIM,
            file.module(),
            colors::RESET
        );
    }

    println!("{}", "─".repeat(50));
    println!(
        "{}OK{} {} file(s), unit ABI v{}",
        colors::GREEN,
        colors::RESET,
        inspection.deps.len(),
        hotloop::ABI_VERSION
    );

    Ok(())
}
