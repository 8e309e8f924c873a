//! The program contract and the boundary types a compiled unit exports.
//!
//! A program is any type implementing [`Program`]. The engine never calls a
//! `Program` directly: it goes through an [`Entry`], a table of plain
//! function pointers produced by [`Entry::of`] inside the compiled unit.
//! Everything reachable from an entry is monomorphized in the unit itself, so
//! panics raised by user code are caught by the unit's own runtime and cross
//! the boundary as `Err(String)`.

use std::any::Any;
use std::cell::RefMut;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::event::{Event, InputState, Key};
use crate::surface::{Surface, SurfaceHandle};

/// Version of the entry table layout.
///
/// Bumped whenever [`Entry`] or [`ProgramObject`] change shape. The loader
/// refuses units that report a different value.
pub const ABI_VERSION: u32 = 1;

/// Name of the exported function returning [`ABI_VERSION`].
pub const ABI_VERSION_SYMBOL: &str = "hotloop_abi_version";

/// Name of the exported function returning the unit's [`Entry`].
pub const ENTRY_SYMBOL: &str = "hotloop_entry";

/// State handed from an outgoing instance to [`Program::from_instance`].
pub type Snapshot = serde_json::Value;

/// Error type user code returns from `update`.
pub type ProgramError = Box<dyn std::error::Error + Send + Sync>;

/// Return type of [`Program::update`].
pub type UpdateResult = Result<Option<Command>, ProgramError>;

/// Commands `update` can return to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Stop the loop and exit cleanly.
    Quit,
}

/// Largest width or height accepted for a surface.
const MAX_SURFACE_DIM: u32 = 16_384;

/// Errors from validating a [`ProgramConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("surface size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("surface size {width}x{height} exceeds the {max}x{max} limit")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("caption must not be empty")]
    EmptyCaption,
}

/// Surface settings of a program.
///
/// Read once per load through [`Program::config`]. Only used to open the
/// surface; a surface carried over from a previous instance keeps its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    pub width: u32,
    pub height: u32,
    pub caption: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            caption: "Game".to_string(),
        }
    }
}

impl ProgramConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Check the settings can open a surface.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_SURFACE_DIM || self.height > MAX_SURFACE_DIM {
            return Err(ConfigError::TooLarge {
                width: self.width,
                height: self.height,
                max: MAX_SURFACE_DIM,
            });
        }
        if self.caption.trim().is_empty() {
            return Err(ConfigError::EmptyCaption);
        }
        Ok(())
    }
}

/// What a program sees during one tick.
pub struct Frame<'a> {
    events: &'a [Event],
    input: &'a InputState,
    surface: &'a SurfaceHandle,
    tick: u64,
}

impl<'a> Frame<'a> {
    pub fn new(
        events: &'a [Event],
        input: &'a InputState,
        surface: &'a SurfaceHandle,
        tick: u64,
    ) -> Self {
        Self {
            events,
            input,
            surface,
            tick,
        }
    }

    /// Events collected for this tick, in arrival order.
    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    /// Keys held down after this tick's events were applied.
    pub fn input(&self) -> &'a InputState {
        self.input
    }

    /// Whether `key` went down during this tick.
    pub fn key_pressed(&self, key: Key) -> bool {
        self.events.iter().any(|e| *e == Event::KeyDown(key))
    }

    /// Borrow the surface for drawing.
    ///
    /// # Panics
    /// Panics if the surface is already borrowed, i.e. when a previous
    /// `surface()` guard is still alive.
    pub fn surface(&self) -> RefMut<'a, Surface> {
        self.surface.borrow_mut()
    }

    pub fn surface_handle(&self) -> &'a SurfaceHandle {
        self.surface
    }

    /// Ticks since the current instance started, starting at 1.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// The top-level object of a hot-reloadable program.
///
/// The loader picks the first `impl Program for T` at the top of the entry
/// file and builds `T` with [`Program::new`], or with
/// [`Program::from_instance`] when the impl overrides it and the outgoing
/// instance produced a [`Snapshot`].
pub trait Program: 'static {
    /// Build a fresh instance.
    fn new() -> Self
    where
        Self: Sized;

    /// Surface settings; read once per load.
    fn config() -> ProgramConfig
    where
        Self: Sized,
    {
        ProgramConfig::default()
    }

    /// Advance one tick.
    fn update(&mut self, frame: &Frame<'_>) -> UpdateResult;

    /// State to hand to the next instance across a reload.
    fn snapshot(&self) -> Option<Snapshot> {
        None
    }

    /// Build an instance continuing from the previous instance's snapshot.
    fn from_instance(previous: Snapshot) -> Self
    where
        Self: Sized,
    {
        let _ = previous;
        Self::new()
    }
}

/// Object-safe, panic-contained view of a [`Program`].
///
/// This is what the engine holds. Implementations catch unwinding panics and
/// report them, together with `update` errors, as strings.
pub trait ProgramObject {
    /// Rust type name of the wrapped program.
    fn type_name(&self) -> &'static str;

    fn update(&mut self, frame: &Frame<'_>) -> Result<Option<Command>, String>;

    fn snapshot(&self) -> Result<Option<Snapshot>, String>;
}

struct Guarded<P>(P);

impl<P: Program> ProgramObject for Guarded<P> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<P>()
    }

    fn update(&mut self, frame: &Frame<'_>) -> Result<Option<Command>, String> {
        contain(|| self.0.update(frame))?.map_err(|e| error_chain(e.as_ref()))
    }

    fn snapshot(&self) -> Result<Option<Snapshot>, String> {
        contain(|| self.0.snapshot())
    }
}

/// Function table exported by a compiled unit (or registered in-process).
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub abi_version: u32,
    /// Name of the program type, as written in the source.
    pub name: &'static str,
    pub config: fn() -> Result<ProgramConfig, String>,
    pub construct: fn() -> Result<Box<dyn ProgramObject>, String>,
    pub resume: fn(Snapshot) -> Result<Box<dyn ProgramObject>, String>,
}

impl Entry {
    /// Build the entry table for `P`.
    pub fn of<P: Program>(name: &'static str) -> Self {
        Self {
            abi_version: ABI_VERSION,
            name,
            config: config_of::<P>,
            construct: construct::<P>,
            resume: resume::<P>,
        }
    }
}

fn config_of<P: Program>() -> Result<ProgramConfig, String> {
    contain(P::config)
}

fn construct<P: Program>() -> Result<Box<dyn ProgramObject>, String> {
    contain(|| Box::new(Guarded(P::new())) as Box<dyn ProgramObject>)
}

fn resume<P: Program>(previous: Snapshot) -> Result<Box<dyn ProgramObject>, String> {
    contain(move || Box::new(Guarded(P::from_instance(previous))) as Box<dyn ProgramObject>)
}

/// Run `f`, turning an unwinding panic into an error message.
fn contain<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| format!("panicked: {}", panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
