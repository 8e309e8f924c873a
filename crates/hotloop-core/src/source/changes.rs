//! Polling change detection over the tracked files.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::discover::DependencySet;
use super::file::FileStamp;

/// Watches the current [`DependencySet`] plus any pending paths.
///
/// Pending paths are files that failed validation during a reload. They are
/// not part of any set yet, but editing them must trigger the next attempt.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    tracked: Option<DependencySet>,
    pending: Vec<FileStamp>,
}

impl ChangeDetector {
    pub fn new(tracked: DependencySet) -> Self {
        Self {
            tracked: Some(tracked),
            pending: Vec::new(),
        }
    }

    /// Replace the tracked set after a successful reload and drop pending
    /// paths.
    pub fn track(&mut self, tracked: DependencySet) {
        self.tracked = Some(tracked);
        self.pending.clear();
    }

    pub fn tracked(&self) -> Option<&DependencySet> {
        self.tracked.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }

    /// Also watch `path` until the next [`ChangeDetector::track`].
    ///
    /// Paths already tracked or pending are ignored.
    pub fn watch(&mut self, path: &Path) -> io::Result<()> {
        let path = path.canonicalize()?;
        let known = self.tracked.as_ref().is_some_and(|t| t.contains(&path))
            || self.pending.iter().any(|s| s.path() == path);
        if !known {
            tracing::debug!("Watching pending path {}", path.display());
            self.pending.push(FileStamp::new(path)?);
        }
        Ok(())
    }

    pub fn pending(&self) -> impl Iterator<Item = &Path> {
        self.pending.iter().map(FileStamp::path)
    }

    /// Nothing to watch.
    pub fn is_empty(&self) -> bool {
        self.tracked.is_none() && self.pending.is_empty()
    }

    /// Poll every watched file and return the ones that changed.
    ///
    /// Every file is polled even after a change is found, so one call
    /// consumes all pending edits.
    pub fn poll(&mut self) -> io::Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        if let Some(tracked) = &mut self.tracked {
            for file in tracked.iter_mut() {
                if file.changed()? {
                    changed.push(file.path().to_path_buf());
                }
            }
        }
        for stamp in &mut self.pending {
            if stamp.changed()? {
                changed.push(stamp.path().to_path_buf());
            }
        }
        Ok(changed)
    }

    /// Whether any watched file changed since the last poll.
    pub fn any_changed(&mut self) -> io::Result<bool> {
        Ok(!self.poll()?.is_empty())
    }

    /// Block until a watched file changes, polling every `interval`.
    ///
    /// # Errors
    /// Fails when polling fails, or when there is nothing to watch.
    pub fn wait_for_change(&mut self, interval: Duration) -> io::Result<Vec<PathBuf>> {
        if self.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no files to watch for changes",
            ));
        }
        loop {
            let changed = self.poll()?;
            if !changed.is_empty() {
                return Ok(changed);
            }
            thread::sleep(interval);
        }
    }
}
