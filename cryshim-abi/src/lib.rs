//! Binary contract between the launcher and a CryEngine 2 host.
//!
//! Everything here mirrors structures compiled into the host DLLs. Nothing is
//! implemented on our side: the types exist so that the adapters in the
//! launcher can read vtables and fill the init record at the exact offsets
//! the host expects.
//!
//! Calling convention notes:
//!   * non-variadic virtual methods use `thiscall` on x86 and the platform C
//!     convention on x86-64 (see [`virtual_fn!`]);
//!   * variadic virtual methods are `cdecl` with `this` as the first argument
//!     on both widths;
//!   * `va_list` is the MSVC flavour, a plain pointer to the packed arguments.

#[macro_use]
mod vcall;

pub mod console;
pub mod layout;
pub mod log;
pub mod params;
pub mod startup;
pub mod system;

pub use layout::{AbiLayout, FieldLayout, WordSize};
pub use params::{InitParams, ParamsError, CMD_LINE_CAPACITY, USER_PATH_CAPACITY};
pub use startup::{EntryFn, GameRef, GameStartup, GameStartupVtbl, ENTRY_SYMBOL};
