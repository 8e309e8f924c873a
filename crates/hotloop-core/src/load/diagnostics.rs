//! Rustc diagnostics, mapped from unit paths back to the edited files.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// A compilation error with source location information.
#[derive(Debug, Clone)]
pub struct CompileError {
    /// Error message
    pub message: String,

    /// Error code (e.g., "E0308")
    pub code: Option<String>,

    /// Severity level
    pub level: ErrorLevel,

    /// Primary source location, in the original tree
    pub location: Option<SourceLocation>,

    /// Rendered error message, with original paths
    pub rendered: Option<String>,
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Error,
    Warning,
    Note,
    Help,
}

/// A location in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file path
    pub file: PathBuf,

    /// Line number (1-indexed)
    pub line: usize,

    /// Column number (1-indexed)
    pub column: usize,
}

/// Rustc JSON diagnostic format.
#[derive(Debug, Deserialize)]
struct RustcDiagnostic {
    message: String,
    code: Option<RustcCode>,
    level: String,
    spans: Vec<RustcSpan>,
    rendered: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RustcCode {
    code: String,
}

#[derive(Debug, Deserialize)]
struct RustcSpan {
    file_name: String,
    line_start: usize,
    column_start: usize,
    is_primary: bool,
}

/// Maps rustc diagnostics for a unit to the files they came from.
///
/// Units mirror the tracked tree under `unit_src`, keeping every relative
/// path and line number, so mapping is a prefix swap.
pub struct ErrorMapper {
    unit_src: PathBuf,
    original_root: PathBuf,
}

impl ErrorMapper {
    pub fn new(unit_src: impl Into<PathBuf>, original_root: impl Into<PathBuf>) -> Self {
        Self {
            unit_src: unit_src.into(),
            original_root: original_root.into(),
        }
    }

    /// Parse rustc JSON output, keeping errors only.
    pub fn parse_rustc_output(&self, json_output: &str) -> Vec<CompileError> {
        let mut errors = Vec::new();

        for line in json_output.lines() {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<RustcDiagnostic>(line) {
                Ok(diagnostic) => {
                    if is_summary(&diagnostic) {
                        continue;
                    }
                    if let Some(error) = self.map_diagnostic(&diagnostic)
                        && error.level == ErrorLevel::Error
                    {
                        errors.push(error);
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        "Failed to parse rustc JSON: {} (line: {})",
                        e,
                        line.chars().take(100).collect::<String>()
                    );
                }
            }
        }

        errors
    }

    fn map_diagnostic(&self, diagnostic: &RustcDiagnostic) -> Option<CompileError> {
        let level = match diagnostic.level.as_str() {
            "error" | "error: internal compiler error" => ErrorLevel::Error,
            "warning" => ErrorLevel::Warning,
            "note" => ErrorLevel::Note,
            "help" => ErrorLevel::Help,
            _ => return None,
        };

        let location = diagnostic
            .spans
            .iter()
            .find(|s| s.is_primary)
            .map(|span| SourceLocation {
                file: self.map_path(Path::new(&span.file_name)),
                line: span.line_start,
                column: span.column_start,
            });

        Some(CompileError {
            message: diagnostic.message.clone(),
            code: diagnostic.code.as_ref().map(|c| c.code.clone()),
            level,
            location,
            rendered: diagnostic.rendered.as_deref().map(|r| self.map_text(r)),
        })
    }

    /// Map a path inside the unit to the original file.
    pub fn map_path(&self, path: &Path) -> PathBuf {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.unit_src).ok()
        } else {
            Some(path)
        };
        match relative {
            Some(rel) => self.original_root.join(rel),
            None => path.to_path_buf(),
        }
    }

    fn map_text(&self, text: &str) -> String {
        let unit = self.unit_src.to_string_lossy();
        if unit.is_empty() {
            return text.to_string();
        }
        let original = self.original_root.to_string_lossy();
        text.replace(unit.as_ref(), original.as_ref())
    }
}

/// rustc's closing "aborting due to N previous errors" line.
fn is_summary(diagnostic: &RustcDiagnostic) -> bool {
    diagnostic.spans.is_empty() && diagnostic.message.starts_with("aborting due to")
}

impl CompileError {
    /// Create an error with just a message.
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            level: ErrorLevel::Error,
            location: None,
            rendered: None,
        }
    }

    /// Create an error from raw rustc output.
    pub fn simple_rendered(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self {
            message: msg.clone(),
            code: None,
            level: ErrorLevel::Error,
            location: None,
            rendered: Some(msg),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rendered) = &self.rendered {
            return write!(f, "{}", rendered.trim_end());
        }

        match &self.code {
            Some(code) => write!(f, "error[{code}]: {}", self.message)?,
            None => write!(f, "error: {}", self.message)?,
        }
        if let Some(loc) = &self.location {
            write!(f, "\n  --> {}:{}:{}", loc.file.display(), loc.line, loc.column)?;
        }
        Ok(())
    }
}

/// A unit failed to compile.
#[derive(Debug, Error)]
#[error("{}", render(.errors))]
pub struct CompileFailure {
    pub errors: Vec<CompileError>,
}

fn render(errors: &[CompileError]) -> String {
    let mut out = match errors.len() {
        1 => "compilation failed with 1 error".to_string(),
        n => format!("compilation failed with {n} errors"),
    };
    for error in errors {
        out.push('\n');
        out.push_str(&error.to_string());
    }
    out
}
