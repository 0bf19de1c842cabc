use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cmdline::CmdLine;
use crate::error::BootError;
use crate::mode::ModeFlags;
use crate::sequencer::LoopMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("cannot parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

impl From<ConfigError> for BootError {
    fn from(err: ConfigError) -> Self {
        BootError::Config(err.to_string())
    }
}

/// Logger configuration used by the launcher.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Filter for the launcher's own crates.
    pub app_level_filter: LevelFilter,
    /// Filter for everything else.
    pub level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { app_level_filter: LevelFilter::Info, level_filter: LevelFilter::Warn }
    }
}

/// Launcher configuration, read from an optional TOML file and then
/// overridden by the command line.
/// Please use [`LauncherConfigBuilder`] if you want to build it from code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub mode: ModeFlags,
    /// Game root; defaults to the launcher's install folder.
    pub root: Option<PathBuf>,
    pub user_path: Option<String>,
    pub log_file_name: Option<String>,
    /// Defaults to the update loop for the game and to the host loop for a
    /// dedicated server.
    pub loop_mode: Option<LoopMode>,
    /// Skips the D3D10 renderer.
    pub dx9: bool,
    pub logger_config: Option<LoggerConfig>,
}

impl LauncherConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Reads the file named by `-shimconfig`, if any, and applies the
    /// command-line options on top.
    pub fn load(cmdline: &CmdLine) -> Result<Self, ConfigError> {
        let config = match cmdline.arg_value("shimconfig") {
            Some(path) => Self::from_toml_file(Path::new(path))?,
            None => Self::default(),
        };
        Ok(config.merge_cmdline(cmdline))
    }

    pub fn merge_cmdline(mut self, cmdline: &CmdLine) -> Self {
        self.mode |= ModeFlags::from_cmdline(cmdline);
        if let Some(root) = cmdline.arg_value("root") {
            self.root = Some(PathBuf::from(root));
        }
        if let Some(user_path) = cmdline.arg_value("userpath") {
            self.user_path = Some(user_path.to_owned());
        }
        if let Some(log_file) = cmdline.arg_value("logfile") {
            self.log_file_name = Some(log_file.to_owned());
        }
        if cmdline.has_arg("dx9") {
            self.dx9 = true;
        }

        let level = cmdline.arg_value("level").map(str::to_owned);
        if cmdline.has_arg("hostloop") || level.is_some() {
            self.loop_mode = Some(LoopMode::HostRun { level });
        }
        self
    }

    pub fn loop_mode(&self) -> LoopMode {
        match &self.loop_mode {
            Some(mode) => mode.clone(),
            None if self.mode.is_dedicated() => LoopMode::HostRun { level: None },
            None => LoopMode::Update,
        }
    }

    pub fn log_file_name(&self) -> &str {
        self.log_file_name.as_deref().unwrap_or_else(|| self.mode.default_log_file())
    }

    pub fn logger_config(&self) -> LoggerConfig {
        self.logger_config.clone().unwrap_or_default()
    }
}

/// `LauncherConfigBuilder` is a convenience builder to create a `LauncherConfig` from code.
pub struct LauncherConfigBuilder {
    config: LauncherConfig,
}

impl LauncherConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_mode(mut self, mode: ModeFlags) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = Some(root.into());
        self
    }

    pub fn with_user_path(mut self, user_path: impl Into<String>) -> Self {
        self.config.user_path = Some(user_path.into());
        self
    }

    pub fn with_log_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.log_file_name = Some(name.into());
        self
    }

    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.config.loop_mode = Some(loop_mode);
        self
    }

    pub fn with_dx9(mut self, dx9: bool) -> Self {
        self.config.dx9 = dx9;
        self
    }

    /// Sets the logger configuration for the launcher
    pub fn with_logger_config(mut self, logger_config: LoggerConfig) -> Self {
        self.config.logger_config = Some(logger_config);
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> LauncherConfig {
        self.config
    }
}

impl Default for LauncherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
