//! End-to-end tests for hotloop CLI commands.
//!
//! `check` and `clean` need no toolchain; `run` against a real program
//! compiles units with rustc and is ignored by default.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// A temporary directory holding a program.
struct TestProgram {
    temp_dir: TempDir,
    entry_path: PathBuf,
}

impl TestProgram {
    fn new(source: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let entry_path = temp_dir.path().join("game.rs");
        fs::write(&entry_path, source).expect("Failed to write entry");

        Self {
            temp_dir,
            entry_path,
        }
    }

    fn with_module(self, name: &str, source: &str) -> Self {
        fs::write(self.temp_dir.path().join(name), source).expect("Failed to write module");
        self
    }

    fn entry(&self) -> &str {
        self.entry_path.to_str().unwrap()
    }

    fn hotloop_dir(&self) -> PathBuf {
        self.temp_dir.path().join(".hotloop")
    }
}

fn hotloop() -> Command {
    Command::cargo_bin("hotloop").expect("Failed to find hotloop binary")
}

fn quitting_program() -> String {
    r#"use hotloop::prelude::*;

mod world;

pub struct Game {
    ticks: u64,
}

impl Program for Game {
    fn new() -> Self {
        Game { ticks: 0 }
    }

    fn update(&mut self, frame: &Frame<'_>) -> UpdateResult {
        frame.surface().fill(Color::rgb(world::SHADE, 0, 0));
        self.ticks += 1;
        if self.ticks == 3 {
            return Ok(Some(Command::Quit));
        }
        Ok(None)
    }
}

fn main() {
    hotloop_core::run(file!()).unwrap();
}
"#
    .to_string()
}

// =============================================================================
// hotloop check Tests
// =============================================================================

#[test]
fn test_check_reports_program_and_files() {
    let program = TestProgram::new(&quitting_program()).with_module("world.rs", "pub const SHADE: u8 = 200;\n");

    hotloop()
        .args(["check", program.entry()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Game"))
        .stdout(predicate::str::contains("world.rs"))
        .stdout(predicate::str::contains("2 file(s)"));
}

#[test]
fn test_check_reports_continuation() {
    let program = TestProgram::new(
        "struct Game;\nimpl Program for Game {\n    fn from_instance(previous: Snapshot) -> Self { Game }\n}\n",
    );

    hotloop()
        .args(["check", program.entry()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Continues from the previous instance"));
}

#[test]
fn test_check_missing_program() {
    let program = TestProgram::new("struct Game;\nfn main() {}\n");

    hotloop()
        .args(["check", program.entry()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no type implementing `Program`"));
}

#[test]
fn test_check_syntax_error_names_file() {
    let program = TestProgram::new("mod world;\nstruct Game;\nimpl Program for Game {}\n")
        .with_module("world.rs", "pub fn broken() { let = 1; }\n");

    hotloop()
        .args(["check", program.entry()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("world.rs:1"));
}

#[test]
fn test_check_nonexistent_entry() {
    hotloop()
        .args(["check", "/nonexistent/game.rs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

// =============================================================================
// hotloop clean Tests
// =============================================================================

#[test]
fn test_clean_removes_build_dir() {
    let program = TestProgram::new(&quitting_program());
    fs::create_dir_all(program.hotloop_dir().join("build/units/stale")).unwrap();

    hotloop()
        .args(["clean", program.entry()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    assert!(!program.hotloop_dir().exists());
    assert!(program.entry_path.exists());
}

#[test]
fn test_clean_without_build_dir() {
    let program = TestProgram::new(&quitting_program());

    hotloop()
        .args(["clean", program.temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}

// =============================================================================
// hotloop run Tests
// =============================================================================

#[test]
fn test_run_nonexistent_entry() {
    hotloop()
        .args(["run", "/nonexistent/game.rs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_run_rejects_bad_extern() {
    hotloop()
        .args(["run", "game.rs", "--extern", "no-equals-sign"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=PATH"));
}

#[test]
#[ignore = "compiles units with rustc"]
fn test_run_quits() {
    let program = TestProgram::new(&quitting_program()).with_module("world.rs", "pub const SHADE: u8 = 200;\n");

    hotloop()
        .args(["run", program.entry(), "--unpaced", "--max-ticks", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quit"))
        .stdout(predicate::str::contains("after 3 ticks"));

    let units = program.hotloop_dir().join("build/units");
    assert_eq!(fs::read_dir(units).unwrap().count(), 0);
}
