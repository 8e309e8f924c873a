//! The per-tick I/O provider the loop drives.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use hotloop::{Event, ProgramConfig, Surface, SurfaceHandle};

use crate::error::Result;

/// Window, input and presentation for the reload loop.
///
/// Implementations own the real window. The loop opens a surface once per
/// program lifetime (a reload reuses it), polls events every tick and
/// presents the surface after each successful `update`.
pub trait Platform {
    fn open_surface(&mut self, config: &ProgramConfig) -> Result<SurfaceHandle>;

    /// Events since the previous call, in arrival order.
    fn poll_events(&mut self) -> Result<Vec<Event>>;

    fn present(&mut self, surface: &SurfaceHandle) -> Result<()>;

    /// Called once when the loop exits cleanly.
    fn shutdown(&mut self) {}
}

/// A platform without a window.
///
/// Plays back scripted event batches, one per tick, and counts what the
/// loop asked of it. Used by the CLI's `run` command and by tests.
#[derive(Default)]
pub struct HeadlessPlatform {
    script: VecDeque<Vec<Event>>,
    surfaces_opened: usize,
    frames_presented: u64,
    last_presented: Option<SurfaceHandle>,
    shut_down: bool,
}

impl fmt::Debug for HeadlessPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPlatform")
            .field("scripted", &self.script.len())
            .field("surfaces_opened", &self.surfaces_opened)
            .field("frames_presented", &self.frames_presented)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `batches` on consecutive ticks, then nothing.
    pub fn with_script(batches: impl IntoIterator<Item = Vec<Event>>) -> Self {
        Self {
            script: batches.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Queue one more batch after the scripted ones.
    pub fn push_events(&mut self, batch: Vec<Event>) {
        self.script.push_back(batch);
    }

    pub fn surfaces_opened(&self) -> usize {
        self.surfaces_opened
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Checksum of the pixels of the last presented surface.
    ///
    /// Computed on call from the surface as it is now, so drawing after the
    /// last `present` shows up here.
    pub fn last_frame_checksum(&self) -> Option<u64> {
        self.last_presented.as_ref().map(|surface| checksum(&surface.borrow()))
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Platform for HeadlessPlatform {
    fn open_surface(&mut self, config: &ProgramConfig) -> Result<SurfaceHandle> {
        self.surfaces_opened += 1;
        tracing::debug!(
            "Opened headless surface {}x{} \"{}\"",
            config.width,
            config.height,
            config.caption
        );
        Ok(Surface::open(config))
    }

    fn poll_events(&mut self) -> Result<Vec<Event>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }

    fn present(&mut self, surface: &SurfaceHandle) -> Result<()> {
        self.frames_presented += 1;
        if !self
            .last_presented
            .as_ref()
            .is_some_and(|last| Rc::ptr_eq(last, surface))
        {
            self.last_presented = Some(Rc::clone(surface));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}

/// FNV-1a over the pixel bytes.
fn checksum(surface: &Surface) -> u64 {
    surface
        .pixels()
        .iter()
        .flat_map(|p| [p.r, p.g, p.b])
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}
