//! Tracked source files and their modification stamps.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result};

/// Module path of the entry file.
pub const ROOT_MODULE: &str = "crate";

/// Last-known modification time of one file.
///
/// Shared by [`SourceFile`] and by paths the change detector watches after
/// they failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    path: PathBuf,
    last_modified: SystemTime,
}

impl FileStamp {
    /// Record the current modification time of `path`.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let last_modified = modified(&path)?;
        Ok(Self {
            path,
            last_modified,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// Whether the file was modified since the last observation.
    ///
    /// A detected change is stored, so each edit is reported exactly once.
    pub fn changed(&mut self) -> io::Result<bool> {
        let current = modified(&self.path)?;
        if current == self.last_modified {
            return Ok(false);
        }
        self.last_modified = current;
        Ok(true)
    }
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// One file the running program is built from.
///
/// Constructed only from a path that exists and parses as a Rust file.
/// Contents are never cached; [`SourceFile::read`] goes to disk every time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    module: String,
    stamp: FileStamp,
}

impl SourceFile {
    /// Open and validate a file contributing `module`.
    pub fn open(path: &Path, module: impl Into<String>) -> Result<Self> {
        Self::load(path, module).map(|(file, _)| file)
    }

    /// Open and validate the entry file.
    pub fn entry(path: &Path) -> Result<Self> {
        Self::open(path, ROOT_MODULE)
    }

    /// Open a file and keep the syntax tree produced while validating it.
    pub(crate) fn load(path: &Path, module: impl Into<String>) -> Result<(Self, syn::File)> {
        Self::load_with_source(path, module).map(|(file, _, ast)| (file, ast))
    }

    /// Open a file and keep both the text that was validated and its tree.
    pub(crate) fn load_with_source(
        path: &Path,
        module: impl Into<String>,
    ) -> Result<(Self, String, syn::File)> {
        let path = path.canonicalize()?;
        // Stamp before reading so an edit racing the parse is seen later.
        let stamp = FileStamp::new(&path)?;
        let file = Self {
            module: module.into(),
            stamp,
        };
        let source = file.read()?;
        let ast = file.parse_source(&source)?;
        Ok((file, source, ast))
    }

    /// Canonical path.
    pub fn path(&self) -> &Path {
        self.stamp.path()
    }

    /// Module path the file provides, e.g. `crate::player`.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn stamp(&self) -> &FileStamp {
        &self.stamp
    }

    /// Current contents.
    pub fn read(&self) -> Result<String> {
        Ok(fs::read_to_string(self.path())?)
    }

    /// Parse the current contents.
    pub fn parse(&self) -> Result<syn::File> {
        self.parse_source(&self.read()?)
    }

    fn parse_source(&self, source: &str) -> Result<syn::File> {
        syn::parse_file(source).map_err(|e| Error::invalid_dependency(self.path(), &e))
    }

    /// Check the current contents parse as a Rust file.
    pub fn validate(&self) -> Result<()> {
        self.parse().map(|_| ())
    }

    /// See [`FileStamp::changed`].
    pub fn changed(&mut self) -> io::Result<bool> {
        self.stamp.changed()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::bump_mtime;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_is_validated() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("game.rs");
        fs::write(&path, "struct Game;\nfn main() {}\n").unwrap();

        let file = SourceFile::entry(&path).expect("Failed to open entry");
        assert_eq!(file.module(), "crate");
        assert!(file.path().is_absolute());
        assert!(file.read().unwrap().contains("struct Game"));
    }

    #[test]
    fn test_load_with_source_keeps_text_and_tree() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("game.rs");
        fs::write(&path, "mod player;\nstruct Game;\n").unwrap();

        let (file, source, ast) = SourceFile::load_with_source(&path, ROOT_MODULE).unwrap();
        assert_eq!(file.module(), "crate");
        assert_eq!(source, "mod player;\nstruct Game;\n");
        assert_eq!(ast.items.len(), 2);
    }

    #[test]
    fn test_invalid_file_reports_line() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("broken.rs");
        fs::write(&path, "fn ok() {}\n\nfn broken() { let = 1; }\n").unwrap();

        let err = SourceFile::entry(&path).unwrap_err();
        match err {
            Error::InvalidDependency { path: p, line, .. } => {
                assert!(p.ends_with("broken.rs"));
                assert_eq!(line, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let err = SourceFile::entry(&temp.path().join("nope.rs")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_changed_updates_on_read() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("game.rs");
        fs::write(&path, "struct Game;").unwrap();

        let mut file = SourceFile::entry(&path).unwrap();
        assert!(!file.changed().unwrap());

        bump_mtime(&path, 5);
        assert!(file.changed().unwrap());
        assert!(!file.changed().unwrap());
    }

    #[test]
    fn test_read_sees_latest_contents() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("game.rs");
        fs::write(&path, "struct A;").unwrap();
        let file = SourceFile::entry(&path).unwrap();

        fs::write(&path, "struct B;").unwrap();
        assert_eq!(file.read().unwrap(), "struct B;");
        assert_eq!(file.read().unwrap(), "struct B;");
    }

    #[test]
    fn test_changed_after_delete_is_error() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("gone.rs");
        fs::write(&path, "").unwrap();
        let mut stamp = FileStamp::new(&path).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(stamp.changed().is_err());
    }
}
