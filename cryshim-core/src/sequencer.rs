//! Drives a host engine from load to termination.
//!
//! ```text
//! Unloaded -> Loaded -> Initialized -> Running -> ShuttingDown -> Terminated
//! ```
//!
//! The sequencer exclusively owns the host's startup object. Its `shutdown`
//! consumes the object, so it runs at most once, and dropping a sequencer
//! that still owns one shuts it down.

use std::ffi::CString;
use std::fmt;

use cryshim_abi::InitParams;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::builds::{self, BuildInfo};
use crate::engine::{AbortHandle, EngineModule, FrameDriver, GameStartup};
use crate::error::{BootError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootState {
    Unloaded,
    Loaded,
    Initialized,
    Running,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootState::Unloaded => "unloaded",
            BootState::Loaded => "loaded",
            BootState::Initialized => "initialized",
            BootState::Running => "running",
            BootState::ShuttingDown => "shutting down",
            BootState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Who owns the main loop once the host is initialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoopMode {
    /// The launcher calls `Update` until it returns zero.
    #[default]
    Update,
    /// The host runs its own loop through `Run`.
    HostRun { level: Option<String> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `Update` returned zero.
    HostRequested,
    /// `Run` returned.
    HostLoopExited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub frames: u64,
    pub stop: StopReason,
}

pub struct Sequencer<M: EngineModule> {
    state: BootState,
    startup: Option<M::Startup>,
    module: Option<M>,
    build: Option<BuildInfo>,
}

impl<M: EngineModule> Sequencer<M> {
    pub fn new() -> Self {
        Self { state: BootState::Unloaded, startup: None, module: None, build: None }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    /// The validated build, once initialized.
    pub fn build(&self) -> Option<BuildInfo> {
        self.build
    }

    fn expect_state(&self, expected: BootState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BootError::InvalidState { state: self.state, operation })
        }
    }

    pub fn attach(&mut self, module: M) -> Result<()> {
        self.expect_state(BootState::Unloaded, "attach a module")?;
        debug!("Host module attached: {}", module.identity());
        self.module = Some(module);
        self.state = BootState::Loaded;
        Ok(())
    }

    /// Validates the build, creates the startup object and initializes it.
    ///
    /// A build that fails validation leaves the sequencer `Loaded` without
    /// the factory having been called. A host whose `Init` fails is shut down
    /// and the sequencer ends `Terminated`.
    pub fn initialize(&mut self, params: &mut InitParams) -> Result<BuildInfo> {
        self.expect_state(BootState::Loaded, "initialize")?;
        let Some(module) = self.module.as_mut() else {
            return Err(BootError::InvalidState { state: self.state, operation: "initialize" });
        };

        let build = builds::classify(module.identity())?;
        info!("{} {}", build.product, build.identity);

        let mut startup = module
            .create_startup()?
            .ok_or_else(|| BootError::InitializationFailed("the startup factory returned null".into()))?;

        if !startup.init(params) {
            self.state = BootState::ShuttingDown;
            startup.shutdown();
            self.state = BootState::Terminated;
            return Err(BootError::InitializationFailed("IGameStartup::Init returned false".into()));
        }

        self.startup = Some(startup);
        self.build = Some(build);
        self.state = BootState::Initialized;
        Ok(build)
    }

    /// Runs the main loop, then shuts the host down.
    ///
    /// The abort flag is checked before every update; an abort still shuts
    /// the host down before [`BootError::Aborted`] is returned.
    pub fn run<D: FrameDriver>(&mut self, mode: &LoopMode, driver: &mut D, abort: &AbortHandle) -> Result<RunOutcome> {
        self.expect_state(BootState::Initialized, "run")?;

        let level = match mode {
            LoopMode::HostRun { level: Some(level) } => match CString::new(level.as_str()) {
                Ok(level) => Some(level),
                Err(_) => {
                    driver.before_shutdown();
                    self.shutdown();
                    return Err(BootError::Config(format!("level name {level:?} contains a NUL byte")));
                }
            },
            _ => None,
        };

        let Some(startup) = self.startup.as_mut() else {
            return Err(BootError::InvalidState { state: self.state, operation: "run" });
        };
        self.state = BootState::Running;

        let outcome = match mode {
            LoopMode::Update => {
                let mut frames = 0u64;
                loop {
                    if abort.is_raised() {
                        warn!("Abort requested after {frames} frames");
                        break Err(BootError::Aborted(format!("fatal error after {frames} frames")));
                    }
                    let have_focus = driver.have_focus();
                    frames += 1;
                    if startup.update(have_focus, 0) == 0 {
                        break Ok(RunOutcome { exit_code: 0, frames, stop: StopReason::HostRequested });
                    }
                }
            }
            LoopMode::HostRun { .. } => {
                if abort.is_raised() {
                    Err(BootError::Aborted("fatal error before the host loop started".into()))
                } else {
                    let exit_code = startup.run(level.as_deref());
                    Ok(RunOutcome { exit_code, frames: 0, stop: StopReason::HostLoopExited })
                }
            }
        };

        driver.before_shutdown();
        self.shutdown();
        outcome
    }

    /// Shuts the host down if it is still alive. Safe to call in any state.
    pub fn shutdown(&mut self) {
        if let Some(startup) = self.startup.take() {
            self.state = BootState::ShuttingDown;
            debug!("Shutting down the host");
            startup.shutdown();
        }
        self.state = BootState::Terminated;
    }
}

impl<M: EngineModule> Default for Sequencer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: EngineModule> Drop for Sequencer<M> {
    fn drop(&mut self) {
        if self.startup.is_some() {
            self.shutdown();
        }
    }
}
