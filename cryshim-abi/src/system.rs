use std::ffi::{c_char, c_void};

use crate::console::Console;
use crate::log::MiniLog;

/// `ISystem`, owned by CrySystem.
#[repr(C)]
pub struct System {
    pub vtable: *const SystemVtbl,
}

virtual_fn! {
    pub type GetGlobalEnvironmentFn = fn(*mut System) -> *mut GlobalEnvironment;
    pub type GetRootFolderFn = fn(*mut System) -> *const c_char;
    pub type IsQuittingFn = fn(*mut System) -> bool;
}

/// `void Error(const char *format, ...)`: logs, shows a message box and
/// terminates the process.
pub type ErrorFn = unsafe extern "C" fn(*mut System, *const c_char, ...);

/// Leading part of the `ISystem` vtable, up to `Error`. Later slots are never
/// read, so they are not described.
#[repr(C)]
pub struct SystemVtbl {
    pub release: *const c_void,
    pub get_global_environment: GetGlobalEnvironmentFn,
    pub get_root_folder: GetRootFolderFn,
    /// `Update`, `RenderBegin`, `Render`, `RenderEnd`, `RenderStatistics`,
    /// `AllocMem`, `GetUsedMemory`, `GetUserName`, `GetCPUFlags`,
    /// `GetSecondsPerCycle`, `DumpMemoryUsageStatistics`, `Quit`, `Relaunch`,
    /// `IsRelaunch`, `SerializingFile`, `IsSerializingFile`.
    pub _unused: [*const c_void; 16],
    pub is_quitting: IsQuittingFn,
    pub error: ErrorFn,
}

/// Leading part of `SSystemGlobalEnvironment` (the engine's `gEnv`): the
/// interface pointers. The flags and platform info after them are never read.
#[repr(C)]
pub struct GlobalEnvironment {
    pub system: *mut System,
    pub game: *mut c_void,
    pub network: *mut c_void,
    pub renderer: *mut c_void,
    pub input: *mut c_void,
    pub timer: *mut c_void,
    pub console: *mut Console,
    pub script_system: *mut c_void,
    pub engine_3d: *mut c_void,
    pub sound_system: *mut c_void,
    pub music_system: *mut c_void,
    pub physical_world: *mut c_void,
    pub movie_system: *mut c_void,
    pub ai_system: *mut c_void,
    pub entity_system: *mut c_void,
    pub cry_font: *mut c_void,
    pub cry_pak: *mut c_void,
    pub log: *mut MiniLog,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn vtable_slot_indices() {
        let slot = size_of::<usize>();
        assert_eq!(offset_of!(SystemVtbl, get_global_environment), slot);
        assert_eq!(offset_of!(SystemVtbl, is_quitting), 19 * slot);
        assert_eq!(offset_of!(SystemVtbl, error), 20 * slot);
    }

    #[test]
    fn environment_pointer_indices() {
        let slot = size_of::<usize>();
        assert_eq!(offset_of!(GlobalEnvironment, console), 6 * slot);
        assert_eq!(offset_of!(GlobalEnvironment, log), 17 * slot);
    }
}
