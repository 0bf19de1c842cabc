use std::env;
use std::ffi::{c_void, CString};
use std::path::{self, PathBuf};
use std::process;
use std::ptr;

use anyhow::{Context, Result};
use cryshim_abi::{InitParams, WordSize};
use cryshim_core::cmdline::CmdLine;
use cryshim_core::config::{LauncherConfig, LoggerConfig};
use cryshim_core::engine::{AbortHandle, FrameDriver};
use cryshim_core::sequencer::LoopMode;
use cryshim_core::{logger, paths, BuildInfo, Sequencer};
use log::{error, info, warn};

use crate::crash_test;
use crate::host::EngineContext;
use crate::loader::EngineModules;

pub struct Launcher {
    cmdline: CmdLine,
    config: LauncherConfig,
    abort: AbortHandle,
}

/// Frame driver for the real host. The crash-test command goes away before
/// the host does.
struct HostDriver;

impl FrameDriver for HostDriver {
    fn before_shutdown(&mut self) {
        crash_test::unregister();
    }
}

#[cfg(windows)]
fn instance_handle() -> *mut c_void {
    match libloading::os::windows::Library::this() {
        Ok(exe) => exe.into_raw() as usize as *mut c_void,
        Err(err) => {
            warn!("Cannot get the launcher module handle: {err}");
            ptr::null_mut()
        }
    }
}

#[cfg(not(windows))]
fn instance_handle() -> *mut c_void {
    ptr::null_mut()
}

/// Ctrl-C handling while the launcher drives the frames: the first press
/// stops the loop at the next frame, a second one leaves at once.
fn on_interrupt(abort: &AbortHandle) -> bool {
    if abort.is_raised() {
        return true;
    }
    warn!("Interrupted, stopping after the current frame");
    abort.raise();
    false
}

fn install_interrupt_handler(abort: AbortHandle) {
    let result = ctrlc::set_handler(move || {
        if on_interrupt(&abort) {
            process::exit(1);
        }
    });
    if let Err(err) = result {
        warn!("Cannot install the Ctrl-C handler: {err}");
    }
}

fn banner(build: &BuildInfo) -> String {
    format!(
        "cryshim {} ({}) running {} {}",
        env!("CARGO_PKG_VERSION"),
        WordSize::NATIVE,
        build.product,
        build.identity
    )
}

impl Launcher {
    /// Reads the process command line and the optional config file, then
    /// starts logging.
    pub fn from_env() -> Result<Self> {
        let cmdline = CmdLine::from_env();
        let config = LauncherConfig::load(&cmdline)?;
        Ok(Self::new(cmdline, config))
    }

    pub fn new(cmdline: CmdLine, config: LauncherConfig) -> Self {
        logger::init_logging(&config.logger_config());
        Self { cmdline, config, abort: AbortHandle::new() }
    }

    /// Raising it makes the update loop stop before the next frame.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Absolute game root, so it stays valid once it is the working directory.
    fn root(&self) -> Result<PathBuf> {
        let exe = env::current_exe().context("Cannot locate the launcher executable")?;
        let root = paths::root_folder(self.config.root.as_deref(), &exe);
        path::absolute(&root).with_context(|| format!("Cannot resolve {}", root.display()))
    }

    fn init_params(&self, log_file: &CString) -> Result<InitParams> {
        let mut params = InitParams::new();
        params.instance = instance_handle();
        params.log_file_name = log_file.as_ptr();
        params.set_cmd_line(self.cmdline.as_str())?;
        if let Some(user_path) = &self.config.user_path {
            params.set_user_path(user_path)?;
        }
        self.config.mode.apply(&mut params);
        Ok(params)
    }

    /// Runs the host to completion and returns its exit code.
    pub fn run(self) -> Result<i32> {
        let root = self.root()?;
        info!("Root directory: {}", root.display());
        env::set_current_dir(&root).with_context(|| format!("Cannot enter {}", root.display()))?;

        let log_file = CString::new(self.config.log_file_name()).context("Invalid log file name")?;
        let mut params = self.init_params(&log_file)?;

        let modules = EngineModules::load(&root, self.config.mode, self.config.dx9)?;
        for module in modules.loaded() {
            info!("{} loaded from {}", module.name(), module.path().display());
        }

        let mut sequencer = Sequencer::new();
        sequencer.attach(modules)?;
        let build = sequencer.initialize(&mut params)?;

        // SAFETY: `params` just went through a successful Init.
        match unsafe { EngineContext::from_params(&params) } {
            Some(context) => {
                context.log_always(&banner(&build));
                if let Some(host_root) = context.root_folder().filter(|r| !r.is_empty()) {
                    context.log_always(&format!("Root directory: {host_root}"));
                }
                crash_test::register(context);
            }
            None => warn!("The host did not publish ISystem, console integration disabled"),
        }

        #[cfg(feature = "wars-timer-patch")]
        {
            if let Some(patch) = cryshim_core::patches::timer_patch(&build, self.config.mode) {
                // SAFETY: the addresses belong to CryRenderNULL of exactly this build.
                unsafe { crate::patch::apply_timer_patch(&patch) };
            }
        }

        // the host's own loop handles the console itself
        let loop_mode = self.config.loop_mode();
        if loop_mode == LoopMode::Update {
            install_interrupt_handler(self.abort.clone());
        }

        let outcome = sequencer.run(&loop_mode, &mut HostDriver, &self.abort)?;
        info!("Host stopped after {} frames, exit code {}", outcome.frames, outcome.exit_code);
        Ok(outcome.exit_code)
    }
}

/// Process exit code for a launch; a failure is logged here and nowhere else.
pub fn exit_code(result: Result<i32>) -> i32 {
    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            // a bad config file fails before the launcher sets logging up
            logger::init_logging(&LoggerConfig::default());
            error!("{err:#}");
            1
        }
    }
}
