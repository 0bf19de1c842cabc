use std::ffi::{c_char, c_void};

/// `IMiniLog::ELogType`
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogType {
    Message = 0,
    Warning = 1,
    Error = 2,
    Always = 3,
    WarningAlways = 4,
    ErrorAlways = 5,
    Input = 6,
    InputResponse = 7,
    Comment = 8,
}

/// `IMiniLog` / `ILog`. Only `LogV` is used: it is the one entry point every
/// host log implements, and it needs no variadic call.
#[repr(C)]
pub struct MiniLog {
    pub vtable: *const MiniLogVtbl,
}

virtual_fn! {
    /// `LogV(ELogType, const char *format, va_list)`. With MSVC a `va_list` is
    /// a pointer to the arguments laid out as on the stack.
    pub type LogVFn = fn(*mut MiniLog, LogType, *const c_char, *mut c_char);
}

#[repr(C)]
pub struct MiniLogVtbl {
    pub log_v: LogVFn,
    pub destructor: *const c_void,
}
