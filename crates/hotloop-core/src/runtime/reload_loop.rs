//! The reload loop.
//!
//! Runs the program at a fixed rate and swaps it for a freshly loaded
//! instance whenever a tracked file changes. A failure anywhere in a tick
//! or a load parks the loop until the next edit instead of ending the
//! process.
//!
//! ```text
//!              change every N ticks                 load ok
//!   RUNNING ─────────────────────────► RELOADING ────────────► RUNNING
//!      │                                ▲     │
//!      │ tick fails                     │     │ load fails
//!      ▼                        change  │     ▼
//!   RECOVERING ─────────────────────────┘  RECOVERING
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hotloop::Command;

use super::carryover::carry_over;
use super::clock::FrameClock;
use super::instance::ProgramInstance;
use super::platform::Platform;
use crate::error::{Error, Result};
use crate::load::{Loaded, ProgramLoader};
use crate::source::ChangeDetector;

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// Ticking the current instance.
    Running,
    /// Waiting for an edit after a failure.
    Recovering,
    /// Loading a replacement instance.
    Reloading,
}

impl fmt::Display for ReloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Recovering => "recovering",
            Self::Reloading => "reloading",
        };
        f.write_str(name)
    }
}

/// Loop settings.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Target tick rate; `None` runs unpaced.
    pub fps: Option<u32>,

    /// Ticks between change checks while running.
    pub check_interval: u64,

    /// Poll interval while recovering.
    pub recover_poll: Duration,

    /// Stop after this many ticks in total.
    pub max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fps: Some(60),
            check_interval: 60,
            recover_poll: Duration::from_secs(2),
            max_ticks: None,
        }
    }
}

/// Why [`ReloadLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The program returned [`Command::Quit`].
    Quit,
    /// [`LoopConfig::max_ticks`] was reached.
    TickLimit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Ticks run across all instances.
    pub ticks: u64,
    /// Successful loads, the initial one included.
    pub loads: u64,
    /// Successful loads that replaced a running instance.
    pub reloads: u64,
    pub failed_loads: u64,
    pub failed_ticks: u64,
}

/// Drives one program through edits, failures and reloads.
pub struct ReloadLoop<P: Platform> {
    entry: PathBuf,
    config: LoopConfig,
    loader: ProgramLoader,
    platform: P,
    clock: FrameClock,
    detector: ChangeDetector,
    instance: Option<ProgramInstance>,
    state: ReloadState,
    since_check: u64,
    stats: LoopStats,
}

impl<P: Platform> ReloadLoop<P> {
    /// Prepare a loop for the program rooted at `entry`.
    ///
    /// Nothing is loaded until [`ReloadLoop::run`].
    pub fn new(entry: impl Into<PathBuf>, loader: ProgramLoader, platform: P, config: LoopConfig) -> Self {
        let config = LoopConfig {
            check_interval: config.check_interval.max(1),
            ..config
        };
        Self {
            entry: entry.into(),
            clock: FrameClock::new(config.fps),
            config,
            loader,
            platform,
            detector: ChangeDetector::default(),
            instance: None,
            state: ReloadState::Reloading,
            since_check: 0,
            stats: LoopStats::default(),
        }
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn instance(&self) -> Option<&ProgramInstance> {
        self.instance.as_ref()
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Run until the program quits or the tick limit is reached.
    ///
    /// # Errors
    /// Only an IO error while waiting for changes in the recovering state
    /// ends the loop with an error. Every other failure is logged and
    /// recovered from.
    pub fn run(&mut self) -> Result<ExitReason> {
        tracing::info!(
            "Starting {} with the {} backend",
            self.entry.display(),
            self.loader.backend_name()
        );

        loop {
            let exit = match self.state {
                ReloadState::Running => self.step(),
                ReloadState::Recovering => {
                    self.recover()?;
                    None
                }
                ReloadState::Reloading => {
                    self.reload();
                    None
                }
            };

            if let Some(reason) = exit {
                tracing::info!("Exiting ({:?}) after {} ticks", reason, self.stats.ticks);
                self.platform.shutdown();
                return Ok(reason);
            }
        }
    }

    /// One tick of the running state.
    fn step(&mut self) -> Option<ExitReason> {
        if self.config.max_ticks.is_some_and(|max| self.stats.ticks >= max) {
            return Some(ExitReason::TickLimit);
        }

        self.clock.tick();
        self.stats.ticks += 1;
        self.since_check += 1;

        match self.tick_once() {
            Ok(Some(Command::Quit)) => return Some(ExitReason::Quit),
            Ok(None) => {}
            Err(e) => {
                self.stats.failed_ticks += 1;
                self.enter_recovering(&e);
                return None;
            }
        }

        if self.since_check >= self.config.check_interval {
            self.since_check = 0;
            match self.detector.poll() {
                Ok(changed) if !changed.is_empty() => {
                    log_changes(&changed);
                    self.state = ReloadState::Reloading;
                }
                Ok(_) => {}
                Err(e) => self.enter_recovering(&Error::Io(e)),
            }
        }

        None
    }

    fn tick_once(&mut self) -> Result<Option<Command>> {
        let tick = self.stats.ticks;
        let instance = self.instance.as_mut().ok_or_else(|| Error::Tick {
            tick,
            message: "no program loaded".to_string(),
        })?;

        let events = self.platform.poll_events()?;
        let command = instance.tick(&events)?;
        if let Some(surface) = instance.surface() {
            self.platform.present(surface)?;
        }
        Ok(command)
    }

    /// Block until an edit, then reload.
    fn recover(&mut self) -> Result<()> {
        let changed = self.detector.wait_for_change(self.config.recover_poll)?;
        log_changes(&changed);
        self.state = ReloadState::Reloading;
        Ok(())
    }

    fn reload(&mut self) {
        let loaded = self.loader.load(&self.entry, self.instance.as_ref());
        let Loaded { mut instance, deps } = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                self.stats.failed_loads += 1;
                self.watch_failure(&e);
                self.enter_recovering(&e);
                return;
            }
        };

        if let Some(outgoing) = &self.instance {
            let carried = carry_over(outgoing, &mut instance);
            tracing::debug!("Carried over: {:?}", carried);
        }
        if let Err(e) = instance.start(&mut self.platform) {
            self.stats.failed_loads += 1;
            self.enter_recovering(&e);
            return;
        }

        let name = instance.name().to_string();
        let outgoing = self.instance.replace(instance);
        self.detector.track(deps);
        self.since_check = 0;
        self.clock.reset();
        self.stats.loads += 1;

        if outgoing.is_some() {
            self.stats.reloads += 1;
            tracing::info!("Reloaded `{}`", name);
        } else {
            tracing::info!("Loaded `{}`", name);
        }
        drop(outgoing);
        self.state = ReloadState::Running;
    }

    /// Make sure the next edit that could fix `error` is noticed.
    ///
    /// Covers the file that failed to parse and every file the failed
    /// attempt got as far as discovering, which may not be tracked yet.
    fn watch_failure(&mut self, error: &Error) {
        let mut paths: Vec<PathBuf> = self.loader.attempted_paths().to_vec();
        if let Error::InvalidDependency { path, .. } = error {
            paths.push(path.clone());
        }
        if !self.detector.is_tracking() {
            paths.push(self.entry.clone());
        }

        for path in paths {
            if let Err(e) = self.detector.watch(&path) {
                tracing::warn!("Cannot watch {}: {}", path.display(), e);
            }
        }
    }

    fn enter_recovering(&mut self, error: &Error) {
        tracing::error!("{}", error.report());
        tracing::info!("Waiting for file changes...");
        self.state = ReloadState::Recovering;
    }
}

fn log_changes(changed: &[PathBuf]) {
    for path in changed {
        tracing::info!("Detected change in {}", path.display());
    }
}
