use std::ffi::{c_char, c_int, c_void};

/// `IConsole`, owned by CrySystem.
#[repr(C)]
pub struct Console {
    pub vtable: *const ConsoleVtbl,
}

/// `IConsoleCmdArgs`, handed to command callbacks.
#[repr(C)]
pub struct ConsoleCmdArgs {
    pub vtable: *const ConsoleCmdArgsVtbl,
}

/// `ConsoleCommandFunc`: a free function, so plain `cdecl`.
pub type ConsoleCommandFn = extern "C" fn(*mut ConsoleCmdArgs);

virtual_fn! {
    pub type UnregisterVariableFn = fn(*mut Console, *const c_char, bool);
    pub type AddCommandFn = fn(*mut Console, *const c_char, ConsoleCommandFn, c_int, *const c_char);
    pub type RemoveCommandFn = fn(*mut Console, *const c_char);
    pub type ExecuteStringFn = fn(*mut Console, *const c_char);

    pub type GetArgCountFn = fn(*const ConsoleCmdArgs) -> c_int;
    pub type GetArgFn = fn(*const ConsoleCmdArgs, c_int) -> *const c_char;
    pub type GetCommandLineFn = fn(*const ConsoleCmdArgs) -> *const c_char;
}

/// Leading part of the `IConsole` vtable.
///
/// MSVC groups overloaded virtuals and lays them out in reverse declaration
/// order, which is why the script flavour of `AddCommand` precedes the
/// function flavour.
#[repr(C)]
pub struct ConsoleVtbl {
    /// `Release`, `RegisterString`, `RegisterInt`, `RegisterFloat`, and the two
    /// `Register` overloads.
    pub _unused_head: [*const c_void; 6],
    pub unregister_variable: UnregisterVariableFn,
    /// `SetScrollMax` through `Draw`.
    pub _unused_mid: [*const c_void; 21],
    pub add_script_command: *const c_void,
    pub add_command: AddCommandFn,
    pub remove_command: RemoveCommandFn,
    pub execute_string: ExecuteStringFn,
}

#[repr(C)]
pub struct ConsoleCmdArgsVtbl {
    pub get_arg_count: GetArgCountFn,
    pub get_arg: GetArgFn,
    pub get_command_line: GetCommandLineFn,
}
