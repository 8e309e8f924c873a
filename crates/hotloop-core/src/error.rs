//! Error types for hotloop-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for hotloop-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by [`Error::LoadFailure`].
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in hotloop-core.
#[derive(Debug, Error)]
pub enum Error {
    /// A tracked file does not parse as Rust.
    #[error("invalid dependency {}{}: {message}", path.display(), line.map(|l| format!(":{}", l)).unwrap_or_default())]
    InvalidDependency {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    /// The entry file has no top-level `impl Program for T`.
    #[error("no type implementing `Program` found in {}", .0.display())]
    ProgramNotFound(PathBuf),

    /// Building, loading or instantiating the program failed.
    #[error("failed to load program `{program}`")]
    LoadFailure {
        program: String,
        #[source]
        cause: Cause,
    },

    /// A tick failed: event polling, `update`, or presentation.
    #[error("tick {tick} failed: {message}")]
    Tick { tick: u64, message: String },

    /// Toolchain error.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// The platform could not open, poll or present.
    #[error("platform error: {0}")]
    Platform(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap any failure during build, load or construction.
    pub fn load_failure(program: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::LoadFailure {
            program: program.into(),
            cause: cause.into(),
        }
    }

    /// Build an [`Error::InvalidDependency`] from a syn parse error.
    pub fn invalid_dependency(path: impl Into<PathBuf>, err: &syn::Error) -> Self {
        let start = err.span().start();
        Self::InvalidDependency {
            path: path.into(),
            line: (start.line > 0).then_some(start.line),
            message: err.to_string(),
        }
    }

    /// Render the error with its whole `source()` chain.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dependency_has_line() {
        let err = syn::parse_file("fn main() {\n    let x = ;\n}").unwrap_err();
        let error = Error::invalid_dependency("game.rs", &err);
        match &error {
            Error::InvalidDependency { line, .. } => assert_eq!(*line, Some(2)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.to_string().starts_with("invalid dependency game.rs:2"));
    }

    #[test]
    fn test_report_includes_cause() {
        let error = Error::load_failure("Game", "constructor panicked: boom");
        let report = error.report();
        assert!(report.contains("failed to load program `Game`"));
        assert!(report.contains("caused by: constructor panicked: boom"));
    }
}
