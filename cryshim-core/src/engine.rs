//! Seams between the sequencer and a host engine.
//!
//! The launcher binary implements these over the real vtables; tests
//! implement them with recording mocks.

use std::ffi::CStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cryshim_abi::InitParams;

use crate::builds::BuildIdentity;
use crate::error::Result;

/// The host's `IGameStartup` object.
pub trait GameStartup {
    /// Returns `false` when the host refuses to start. The object must still
    /// be shut down afterwards.
    fn init(&mut self, params: &mut InitParams) -> bool;

    /// One frame. A zero return means the host wants to stop.
    fn update(&mut self, have_focus: bool, update_flags: u32) -> i32;

    /// Hands the whole main loop to the host.
    fn run(&mut self, auto_start_level: Option<&CStr>) -> i32;

    /// Consumes the object; the host frees it.
    fn shutdown(self);
}

/// A loaded set of host libraries exposing the startup factory.
pub trait EngineModule {
    type Startup: GameStartup;

    /// Identity read from the module before any of its code ran.
    fn identity(&self) -> BuildIdentity;

    /// Calls the exported factory. `Ok(None)` is a null return.
    fn create_startup(&mut self) -> Result<Option<Self::Startup>>;
}

/// Per-frame input to the update loop.
pub trait FrameDriver {
    fn have_focus(&mut self) -> bool {
        true
    }

    /// Last call before the host object is shut down.
    fn before_shutdown(&mut self) {}
}

/// A driver that always reports focus.
#[derive(Debug, Default)]
pub struct Headless;

impl FrameDriver for Headless {}

/// Flag raised by a fatal error outside the update loop.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    raised: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_is_shared_between_clones() {
        let abort = AbortHandle::new();
        let other = abort.clone();
        assert!(!abort.is_raised());
        other.raise();
        assert!(abort.is_raised());
    }

    #[test]
    fn abort_from_another_thread() {
        let abort = AbortHandle::new();
        let remote = abort.clone();
        std::thread::spawn(move || remote.raise()).join().unwrap();
        assert!(abort.is_raised());
    }
}
