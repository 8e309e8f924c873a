//! Helpers shared by the reload loop tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use hotloop::{Event, ProgramConfig, SurfaceHandle};
use hotloop_core::{HeadlessPlatform, Platform};
use tempfile::TempDir;

static MTIME_OFFSET: AtomicU64 = AtomicU64::new(10);

/// Write `contents` and give the file a modification time no earlier write
/// had.
pub fn edit(path: &Path, contents: &str) {
    fs::write(path, contents).expect("Failed to write file");
    let offset = MTIME_OFFSET.fetch_add(1, Ordering::SeqCst);
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(SystemTime::now() + Duration::from_secs(offset)))
        .expect("Failed to set mtime");
}

/// Edit `path` once `trigger` is set and the loop had time to fail.
pub fn spawn_fix(trigger: Arc<AtomicBool>, path: PathBuf, contents: &'static str) -> thread::JoinHandle<()> {
    spawn_fix_after(trigger, Duration::from_millis(300), path, contents)
}

/// Edit `path` `delay` after `trigger` is set.
pub fn spawn_fix_after(
    trigger: Arc<AtomicBool>,
    delay: Duration,
    path: PathBuf,
    contents: &'static str,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !trigger.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(delay);
        edit(&path, contents);
    })
}

/// Temporary program directory.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        edit(&path, contents);
        path
    }
}

pub type Edit = Box<dyn FnMut()>;

/// Headless platform that edits files at given polls and remembers the
/// surfaces it opened.
pub struct EditingPlatform {
    pub inner: HeadlessPlatform,
    polls: u64,
    edits: Vec<(u64, Edit)>,
    pub opened: Vec<SurfaceHandle>,
}

impl EditingPlatform {
    pub fn new(inner: HeadlessPlatform) -> Self {
        Self {
            inner,
            polls: 0,
            edits: Vec::new(),
            opened: Vec::new(),
        }
    }

    pub fn on_poll(mut self, poll: u64, edit: impl FnMut() + 'static) -> Self {
        self.edits.push((poll, Box::new(edit)));
        self
    }
}

impl Platform for EditingPlatform {
    fn open_surface(&mut self, config: &ProgramConfig) -> hotloop_core::Result<SurfaceHandle> {
        let surface = self.inner.open_surface(config)?;
        self.opened.push(Rc::clone(&surface));
        Ok(surface)
    }

    fn poll_events(&mut self) -> hotloop_core::Result<Vec<Event>> {
        self.polls += 1;
        for (poll, edit) in &mut self.edits {
            if *poll == self.polls {
                edit();
            }
        }
        self.inner.poll_events()
    }

    fn present(&mut self, surface: &SurfaceHandle) -> hotloop_core::Result<()> {
        self.inner.present(surface)
    }

    fn shutdown(&mut self) {
        self.inner.shutdown();
    }
}

