//! The seam between locating a program and getting its entry table.

use hotloop::Entry;

use super::dylib::LoadedUnit;
use super::locate::ProgramDecl;
use crate::error::Result;
use crate::source::DependencySet;

/// Everything a backend needs to build one load of a program.
///
/// `entry_source` and `entry_ast` are the exact text the loader validated,
/// so a concurrent edit cannot slip in between validation and build.
pub struct BuildRequest<'a> {
    pub deps: &'a DependencySet,
    pub entry_source: &'a str,
    pub entry_ast: &'a syn::File,
    pub program: &'a ProgramDecl,
}

/// A built program, ready to instantiate.
pub struct LoadedProgram {
    /// Only valid while `unit` is alive.
    pub entry: Entry,

    /// Library backing `entry`, when the backend loaded one.
    pub unit: Option<LoadedUnit>,
}

/// Turns a located program into an [`Entry`].
pub trait ProgramBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Build the program described by `request`.
    ///
    /// # Errors
    /// Every failure is a [`crate::Error::LoadFailure`].
    fn build(&mut self, request: &BuildRequest<'_>) -> Result<LoadedProgram>;
}
