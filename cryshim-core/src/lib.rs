pub mod builds;
pub mod cmdline;
pub mod config;
pub mod crash_test;
pub mod engine;
pub mod error;
pub mod logger;
pub mod mode;
pub mod patches;
pub mod paths;
pub mod sequencer;
pub mod version;

pub use builds::{BuildIdentity, BuildInfo, Product};
pub use error::{BootError, Result};
pub use mode::ModeFlags;
pub use sequencer::{BootState, Sequencer};
