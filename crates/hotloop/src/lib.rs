//! hotloop: edit a running game loop on disk and keep playing.
//!
//! This crate is the API that hot-reloadable programs are written against:
//! - **`Program`**: the trait the program's top-level type implements
//! - **`Frame`**: per-tick access to events, pressed keys and the surface
//! - **`Command`**: what `update` can ask the loop to do
//! - **`ProgramConfig`**: surface size and caption, read once per load
//!
//! The engine that discovers, compiles, reloads and drives programs lives in
//! the `hotloop-core` crate.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hotloop::prelude::*;
//!
//! mod player;
//!
//! pub struct Game {
//!     x: i32,
//! }
//!
//! impl Program for Game {
//!     fn new() -> Self {
//!         Game { x: 300 }
//!     }
//!
//!     fn config() -> ProgramConfig {
//!         ProgramConfig::default().with_caption("Game!")
//!     }
//!
//!     fn update(&mut self, frame: &Frame<'_>) -> UpdateResult {
//!         if frame.input().is_pressed(Key::Right) {
//!             self.x += 5;
//!         }
//!         let mut surface = frame.surface();
//!         surface.fill(Color::rgb(135, 206, 255));
//!         surface.fill_rect(Rect::new(self.x, 450, 100, 100), Color::rgb(255, 0, 0));
//!         drop(surface);
//!
//!         if frame.key_pressed(Key::Escape) {
//!             return Ok(Some(Command::Quit));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```
//!
//! Save the file while the loop runs and the new `Game` replaces the old one
//! on the next change check. The surface survives the reload.

pub mod event;
pub mod program;
pub mod surface;

pub use event::{Event, InputState, Key, MouseButton};
pub use program::{
    ABI_VERSION, ABI_VERSION_SYMBOL, Command, ConfigError, ENTRY_SYMBOL, Entry, Frame, Program,
    ProgramConfig, ProgramError, ProgramObject, Snapshot, UpdateResult,
};
pub use surface::{Color, Rect, Surface, SurfaceHandle};

pub mod prelude {
    //! Common imports for hotloop programs.
    //!
    //! ```rust,ignore
    //! use hotloop::prelude::*;
    //! ```

    pub use crate::event::{Event, InputState, Key, MouseButton};
    pub use crate::program::{
        Command, Frame, Program, ProgramConfig, ProgramError, Snapshot, UpdateResult,
    };
    pub use crate::surface::{Color, Rect, Surface};

    // Snapshots are plain JSON values
    pub use serde_json::json;
}
