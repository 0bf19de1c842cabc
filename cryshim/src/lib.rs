//! Launcher for CryEngine 2 games.
//!
//! Loads the host DLLs of a supported Crysis or Crysis Wars install, checks
//! the build, fills the init record and drives `IGameStartup` until the host
//! stops.

pub mod faults;
pub mod host;
pub mod launcher;
pub mod loader;
pub mod patch;

pub use launcher::Launcher;
