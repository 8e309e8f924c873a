//! The live program and the resources it owns.

use std::rc::Rc;

use hotloop::{Command, Event, Frame, InputState, ProgramConfig, ProgramObject, Snapshot, SurfaceHandle};

use super::platform::Platform;
use crate::error::{Error, Result};
use crate::load::LoadedUnit;

/// One instantiation of the program.
pub struct ProgramInstance {
    // Dropped first: its code and vtable live in `unit`.
    program: Box<dyn ProgramObject>,
    name: String,
    config: ProgramConfig,
    surface: Option<SurfaceHandle>,
    input: InputState,
    ticks: u64,
    unit: Option<LoadedUnit>,
}

impl ProgramInstance {
    pub fn new(
        name: impl Into<String>,
        config: ProgramConfig,
        program: Box<dyn ProgramObject>,
        unit: Option<LoadedUnit>,
    ) -> Self {
        Self {
            program,
            name: name.into(),
            config,
            surface: None,
            input: InputState::new(),
            ticks: 0,
            unit,
        }
    }

    /// Program type name as written in the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&SurfaceHandle> {
        self.surface.as_ref()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Ticks run by this instance.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn unit(&self) -> Option<&LoadedUnit> {
        self.unit.as_ref()
    }

    /// Take `surface` unless the instance already has one.
    pub(crate) fn receive_surface(&mut self, surface: &SurfaceHandle) -> bool {
        if self.surface.is_some() {
            return false;
        }
        self.surface = Some(Rc::clone(surface));
        true
    }

    /// Make the instance ready to tick.
    ///
    /// Opens a surface through `platform` when none was carried over.
    /// A carried surface gets the new caption; its size is kept.
    pub fn start<P: Platform + ?Sized>(&mut self, platform: &mut P) -> Result<()> {
        match &self.surface {
            Some(surface) => {
                let mut surface = surface.borrow_mut();
                if surface.caption() != self.config.caption {
                    surface.set_caption(self.config.caption.clone());
                }
                if (surface.width(), surface.height()) != (self.config.width, self.config.height) {
                    tracing::warn!(
                        "Keeping the {}x{} surface; restart to apply {}x{}",
                        surface.width(),
                        surface.height(),
                        self.config.width,
                        self.config.height
                    );
                }
            }
            None => {
                self.surface = Some(platform.open_surface(&self.config)?);
            }
        }
        tracing::debug!("Started `{}`", self.name);
        Ok(())
    }

    /// Apply `events` to the input state and run one `update`.
    pub fn tick(&mut self, events: &[Event]) -> Result<Option<Command>> {
        self.ticks += 1;
        let tick = self.ticks;

        let Some(surface) = &self.surface else {
            return Err(Error::Tick {
                tick,
                message: format!("`{}` was not started", self.name),
            });
        };

        self.input.apply(events);
        let frame = Frame::new(events, &self.input, surface, tick);
        self.program
            .update(&frame)
            .map_err(|message| Error::Tick { tick, message })
    }

    /// State for the next instance; failures are logged and dropped.
    pub fn snapshot(&self) -> Option<Snapshot> {
        match self.program.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Snapshot of `{}` failed, starting fresh: {}", self.name, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for ProgramInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramInstance")
            .field("name", &self.name)
            .field("type_name", &self.program.type_name())
            .field("config", &self.config)
            .field("ticks", &self.ticks)
            .field("unit", &self.unit)
            .finish()
    }
}
