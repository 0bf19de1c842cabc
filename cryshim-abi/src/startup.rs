use std::ffi::{c_char, c_int, c_void};
use std::ptr;

use crate::params::InitParams;

/// Name of the factory every CryGame module exports.
pub const ENTRY_SYMBOL: &[u8] = b"CreateGameStartup\0";

/// `IGameStartup *(*)()`
pub type EntryFn = unsafe extern "C" fn() -> *mut GameStartup;

/// `IGameRef`: a pointer to the host's `IGame*` slot.
#[repr(C)]
pub struct GameRef {
    game: *mut *mut c_void,
}

impl GameRef {
    pub fn null() -> Self {
        Self { game: ptr::null_mut() }
    }

    /// Mirrors `operator IGame*`: both the slot and the game it holds must exist.
    ///
    /// # Safety
    /// A non-null slot must be readable.
    pub unsafe fn is_valid(&self) -> bool {
        !self.game.is_null() && !(*self.game).is_null()
    }
}

/// `IGameStartup` object as seen from outside: only the vtable pointer.
#[repr(C)]
pub struct GameStartup {
    pub vtable: *const GameStartupVtbl,
}

virtual_fn! {
    /// `IGameRef Init(SSystemInitParams&)`. The class return value travels
    /// through a hidden pointer that comes right after `this`.
    pub type InitFn = fn(*mut GameStartup, *mut GameRef, *mut InitParams) -> *mut GameRef;
    pub type ShutdownFn = fn(*mut GameStartup);
    pub type UpdateFn = fn(*mut GameStartup, bool, u32) -> c_int;
    pub type GetRestartLevelFn = fn(*mut GameStartup, *mut *mut c_char) -> bool;
    pub type GetPatchFn = fn(*mut GameStartup) -> *const c_char;
    pub type GetRestartModFn = fn(*mut GameStartup, *mut c_char, c_int) -> bool;
    pub type RunFn = fn(*mut GameStartup, *const c_char) -> c_int;
}

#[repr(C)]
pub struct GameStartupVtbl {
    pub init: InitFn,
    /// Also frees the object.
    pub shutdown: ShutdownFn,
    /// Returns 0 when the game wants to quit.
    pub update: UpdateFn,
    pub get_restart_level: GetRestartLevelFn,
    pub get_patch: GetPatchFn,
    pub get_restart_mod: GetRestartModFn,
    /// The host's own main loop; returns the process exit code.
    pub run: RunFn,
}
