use std::ffi::{c_char, c_void, CStr};
use std::mem::{offset_of, size_of};
use std::ptr;

use thiserror::Error;

use crate::layout::{AbiLayout, WordSize};
use crate::system::System;

pub const CMD_LINE_CAPACITY: usize = 2048;
pub const USER_PATH_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Command line is too long! ({len} bytes, the engine accepts at most {})", CMD_LINE_CAPACITY - 1)]
    CommandLineTooLong { len: usize },

    #[error("User path is too long! ({len} bytes, the engine accepts at most {})", USER_PATH_CAPACITY - 1)]
    UserPathTooLong { len: usize },

    #[error("{field} contains an embedded NUL byte")]
    InteriorNul { field: &'static str },
}

/// `SSystemInitParams`, passed by reference to `IGameStartup::Init`.
///
/// Field order, types and padding are the host's. `system` is written by the
/// host during init. `check_func` and `protected_functions` are never read by
/// the launcher; they only exist to keep the record at its compiled size.
#[repr(C)]
pub struct InitParams {
    pub instance: *mut c_void,
    pub window: *mut c_void,
    pub log: *mut c_void,
    pub log_callback: *mut c_void,
    pub user_callback: *mut c_void,
    pub log_file_name: *const c_char,
    pub validator: *mut c_void,
    pub cmd_line: [u8; CMD_LINE_CAPACITY],
    pub user_path: [u8; USER_PATH_CAPACITY],
    pub editor: bool,
    pub minimal: bool,
    pub testing: bool,
    pub dedicated_server: bool,
    pub system: *mut System,
    pub check_func: *mut c_void,
    pub protected_functions: [*mut c_void; 10],
}

const PTR: usize = size_of::<*const c_void>();

const _: () = assert!(size_of::<InitParams>() == AbiLayout::expected_size(WordSize::NATIVE));
const _: () = assert!(offset_of!(InitParams, cmd_line) == 7 * PTR);
const _: () = assert!(offset_of!(InitParams, user_path) == 7 * PTR + CMD_LINE_CAPACITY);
const _: () = assert!(offset_of!(InitParams, editor) == 7 * PTR + CMD_LINE_CAPACITY + USER_PATH_CAPACITY);
const _: () = assert!(offset_of!(InitParams, system) % PTR == 0);

impl InitParams {
    pub fn new() -> Self {
        Self {
            instance: ptr::null_mut(),
            window: ptr::null_mut(),
            log: ptr::null_mut(),
            log_callback: ptr::null_mut(),
            user_callback: ptr::null_mut(),
            log_file_name: ptr::null(),
            validator: ptr::null_mut(),
            cmd_line: [0; CMD_LINE_CAPACITY],
            user_path: [0; USER_PATH_CAPACITY],
            editor: false,
            minimal: false,
            testing: false,
            dedicated_server: false,
            system: ptr::null_mut(),
            check_func: ptr::null_mut(),
            protected_functions: [ptr::null_mut(); 10],
        }
    }

    /// Copies the process command line into the fixed buffer.
    ///
    /// Fails without touching the buffer when the text plus its terminator
    /// does not fit.
    pub fn set_cmd_line(&mut self, cmd_line: &str) -> Result<(), ParamsError> {
        if cmd_line.len() >= CMD_LINE_CAPACITY {
            return Err(ParamsError::CommandLineTooLong { len: cmd_line.len() });
        }
        copy_c_string(&mut self.cmd_line, cmd_line, "command line")
    }

    pub fn set_user_path(&mut self, user_path: &str) -> Result<(), ParamsError> {
        if user_path.len() >= USER_PATH_CAPACITY {
            return Err(ParamsError::UserPathTooLong { len: user_path.len() });
        }
        copy_c_string(&mut self.user_path, user_path, "user path")
    }

    pub fn cmd_line(&self) -> &CStr {
        buffer_as_cstr(&self.cmd_line)
    }

    pub fn user_path(&self) -> &CStr {
        buffer_as_cstr(&self.user_path)
    }
}

impl Default for InitParams {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_c_string(buffer: &mut [u8], value: &str, field: &'static str) -> Result<(), ParamsError> {
    let bytes = value.as_bytes();
    if bytes.contains(&0) {
        return Err(ParamsError::InteriorNul { field });
    }
    buffer[..bytes.len()].copy_from_slice(bytes);
    buffer[bytes.len()..].fill(0);
    Ok(())
}

fn buffer_as_cstr(buffer: &[u8]) -> &CStr {
    // the setters always leave at least one NUL in the buffer
    CStr::from_bytes_until_nul(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_params_are_zeroed() {
        let params = InitParams::new();
        assert!(params.system.is_null());
        assert!(params.cmd_line.iter().all(|&b| b == 0));
        assert!(!params.dedicated_server);
        assert_eq!(params.cmd_line().to_bytes(), b"");
    }

    #[test]
    fn cmd_line_is_copied_with_terminator() {
        let mut params = InitParams::new();
        params.set_cmd_line("Crysis.exe -devmode").unwrap();
        assert_eq!(params.cmd_line().to_str().unwrap(), "Crysis.exe -devmode");
        assert_eq!(params.cmd_line[19], 0);

        params.set_cmd_line("a").unwrap();
        assert_eq!(params.cmd_line().to_bytes(), b"a");
        assert!(params.cmd_line[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn cmd_line_at_capacity_is_rejected_untouched() {
        let mut params = InitParams::new();
        params.set_cmd_line("keep").unwrap();

        let exact = "x".repeat(CMD_LINE_CAPACITY);
        assert_eq!(
            params.set_cmd_line(&exact),
            Err(ParamsError::CommandLineTooLong { len: CMD_LINE_CAPACITY })
        );
        let longer = "y".repeat(CMD_LINE_CAPACITY + 100);
        assert!(params.set_cmd_line(&longer).is_err());
        assert_eq!(params.cmd_line().to_bytes(), b"keep");
    }

    #[test]
    fn longest_cmd_line_fits() {
        let mut params = InitParams::new();
        let longest = "z".repeat(CMD_LINE_CAPACITY - 1);
        params.set_cmd_line(&longest).unwrap();
        assert_eq!(params.cmd_line().to_bytes().len(), CMD_LINE_CAPACITY - 1);
        assert_eq!(params.cmd_line[CMD_LINE_CAPACITY - 1], 0);
    }

    #[test]
    fn user_path_limits() {
        let mut params = InitParams::new();
        params.set_user_path("C:\\Saves").unwrap();
        assert_eq!(params.user_path().to_bytes(), b"C:\\Saves");
        assert_eq!(
            params.set_user_path(&"p".repeat(USER_PATH_CAPACITY)),
            Err(ParamsError::UserPathTooLong { len: USER_PATH_CAPACITY })
        );
    }

    #[test]
    fn embedded_nul_is_rejected() {
        let mut params = InitParams::new();
        assert_eq!(
            params.set_cmd_line("a\0b"),
            Err(ParamsError::InteriorNul { field: "command line" })
        );
    }
}
