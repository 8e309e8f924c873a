//! Runtime: the live instance, carryover, pacing, platform and reload loop.

mod carryover;
mod clock;
mod instance;
mod platform;
mod reload_loop;

pub use carryover::{Carryover, carry_over};
pub use clock::FrameClock;
pub use instance::ProgramInstance;
pub use platform::{HeadlessPlatform, Platform};
pub use reload_loop::{ExitReason, LoopConfig, LoopStats, ReloadLoop, ReloadState};
