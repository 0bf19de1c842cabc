//! Adapters over the host's vtables. This is the only module that
//! dereferences pointers handed out by the host.

use std::ffi::{c_char, CStr, CString};
use std::ptr::{self, NonNull};

use cryshim_abi::console::{Console, ConsoleCmdArgs, ConsoleCommandFn};
use cryshim_abi::log::{LogType, MiniLog};
use cryshim_abi::system::System;
use cryshim_abi::{self as abi, GameRef, InitParams};
use cryshim_core::crash_test::{CommandArgs, WarningSink};
use cryshim_core::engine::GameStartup;

fn to_cstring(message: &str) -> CString {
    CString::new(message.replace('\0', " ")).unwrap_or_default()
}

/// Owned `IGameStartup*`.
pub struct HostStartup {
    raw: NonNull<abi::GameStartup>,
}

impl HostStartup {
    /// # Safety
    /// `raw` must be a live object returned by `CreateGameStartup`.
    pub unsafe fn from_raw(raw: NonNull<abi::GameStartup>) -> Self {
        Self { raw }
    }

    fn vtable(&self) -> &abi::GameStartupVtbl {
        // SAFETY: guaranteed by `from_raw`.
        unsafe { &*self.raw.as_ref().vtable }
    }
}

impl GameStartup for HostStartup {
    fn init(&mut self, params: &mut InitParams) -> bool {
        let mut game = GameRef::null();
        unsafe {
            let result = (self.vtable().init)(self.raw.as_ptr(), &mut game, params);
            !result.is_null() && (*result).is_valid()
        }
    }

    fn update(&mut self, have_focus: bool, update_flags: u32) -> i32 {
        unsafe { (self.vtable().update)(self.raw.as_ptr(), have_focus, update_flags) }
    }

    fn run(&mut self, auto_start_level: Option<&CStr>) -> i32 {
        let level = auto_start_level.map_or(ptr::null(), CStr::as_ptr);
        unsafe { (self.vtable().run)(self.raw.as_ptr(), level) }
    }

    fn shutdown(self) {
        unsafe { (self.vtable().shutdown)(self.raw.as_ptr()) }
    }
}

/// Host services reachable from `ISystem` once `Init` succeeded.
#[derive(Clone, Copy, Debug)]
pub struct EngineContext {
    system: NonNull<System>,
    console: Option<NonNull<Console>>,
    log: Option<NonNull<MiniLog>>,
}

// SAFETY: the host objects are only ever called from the main thread; the
// context is shared with the console callback through a mutex.
unsafe impl Send for EngineContext {}

impl EngineContext {
    /// # Safety
    /// `params` must have been passed to a successful `Init`.
    pub unsafe fn from_params(params: &InitParams) -> Option<Self> {
        let system = NonNull::new(params.system)?;
        let env = ((*system.as_ref().vtable).get_global_environment)(system.as_ptr());
        let env = env.as_ref()?;
        Some(Self { system, console: NonNull::new(env.console), log: NonNull::new(env.log) })
    }

    pub fn root_folder(&self) -> Option<String> {
        unsafe {
            let folder = ((*self.system.as_ref().vtable).get_root_folder)(self.system.as_ptr());
            (!folder.is_null()).then(|| CStr::from_ptr(folder).to_string_lossy().into_owned())
        }
    }

    pub fn is_quitting(&self) -> bool {
        unsafe { ((*self.system.as_ref().vtable).is_quitting)(self.system.as_ptr()) }
    }

    fn log(&self, kind: LogType, message: &str) {
        let Some(log) = self.log else {
            return;
        };
        let message = to_cstring(message);
        // MSVC va_list: a pointer to the arguments as they would sit on the stack
        let mut va: [*const c_char; 1] = [message.as_ptr()];
        unsafe {
            ((*log.as_ref().vtable).log_v)(log.as_ptr(), kind, c"%s".as_ptr(), va.as_mut_ptr().cast());
        }
    }

    pub fn log_always(&self, message: &str) {
        self.log(LogType::Always, message);
    }

    pub fn log_warning(&self, message: &str) {
        self.log(LogType::WarningAlways, message);
    }

    /// `ISystem::Error`; the host shows the message and terminates.
    pub fn engine_error(&self, message: &str) {
        let message = to_cstring(message);
        unsafe {
            ((*self.system.as_ref().vtable).error)(self.system.as_ptr(), c"%s".as_ptr(), message.as_ptr());
        }
    }

    pub fn add_command(&self, name: &CStr, func: ConsoleCommandFn, help: &CStr) -> bool {
        let Some(console) = self.console else {
            return false;
        };
        unsafe {
            ((*console.as_ref().vtable).add_command)(console.as_ptr(), name.as_ptr(), func, 0, help.as_ptr());
        }
        true
    }

    pub fn remove_command(&self, name: &CStr) {
        if let Some(console) = self.console {
            unsafe { ((*console.as_ref().vtable).remove_command)(console.as_ptr(), name.as_ptr()) }
        }
    }

    /// Removes a console variable without deleting it.
    pub fn unregister_variable(&self, name: &CStr) {
        if let Some(console) = self.console {
            unsafe { ((*console.as_ref().vtable).unregister_variable)(console.as_ptr(), name.as_ptr(), false) }
        }
    }
}

impl WarningSink for EngineContext {
    fn warning(&mut self, message: &str) {
        self.log_warning(message);
    }
}

/// `IConsoleCmdArgs*` for the duration of one command callback.
pub struct HostCmdArgs {
    raw: NonNull<ConsoleCmdArgs>,
}

impl HostCmdArgs {
    /// # Safety
    /// `raw` must be the argument object of the running console command.
    pub unsafe fn from_raw(raw: NonNull<ConsoleCmdArgs>) -> Self {
        Self { raw }
    }

    fn string(ptr: *const c_char) -> Option<String> {
        (!ptr.is_null()).then(|| unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

impl CommandArgs for HostCmdArgs {
    fn arg_count(&self) -> usize {
        let count = unsafe { ((*self.raw.as_ref().vtable).get_arg_count)(self.raw.as_ptr()) };
        usize::try_from(count).unwrap_or(0)
    }

    fn arg(&self, index: usize) -> Option<String> {
        let index = i32::try_from(index).ok()?;
        Self::string(unsafe { ((*self.raw.as_ref().vtable).get_arg)(self.raw.as_ptr(), index) })
    }

    fn command_line(&self) -> String {
        Self::string(unsafe { ((*self.raw.as_ref().vtable).get_command_line)(self.raw.as_ptr()) }).unwrap_or_default()
    }
}
