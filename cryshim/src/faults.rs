//! The real faults behind `sys_crashtest`. Every one of them ends the
//! process; none returns normally except when the host ignores an error.

use std::hint::black_box;
use std::mem;
use std::process;

use cryshim_core::crash_test::{Fault, FaultInjector};
use log::error;

use crate::host::EngineContext;

const BIG_BLOCK: usize = 16 * 1024 * 1024;
const SMALL_BLOCK: usize = 128;

pub struct NativeFaults {
    context: Option<EngineContext>,
}

impl NativeFaults {
    pub fn new(context: Option<EngineContext>) -> Self {
        Self { context }
    }
}

impl FaultInjector for NativeFaults {
    fn inject(&mut self, fault: Fault) {
        error!("sys_crashtest {}: {}", fault.selector(), fault.describe());
        match fault {
            Fault::NullPointerWrite => null_pointer_write(),
            Fault::IntDivisionByZero => int_division_by_zero(),
            Fault::OutOfMemoryBig => exhaust_memory(BIG_BLOCK),
            Fault::EngineError => match self.context {
                Some(context) => context.engine_error(&format!("sys_crashtest {}", fault.selector())),
                None => process::abort(),
            },
            Fault::OutOfMemorySmall => exhaust_memory(SMALL_BLOCK),
            Fault::AssertionFailure => assert!(black_box(false), "sys_crashtest {}", fault.selector()),
            Fault::DebugBreak => debug_break(),
            Fault::Abort => process::abort(),
            Fault::InvalidCrtArgument => invalid_crt_argument(),
            Fault::PureVirtualCall => pure_virtual_call(),
            Fault::UncaughtException => panic!("sys_crashtest {}", fault.selector()),
            Fault::StackOverflow => {
                black_box(overflow_stack(0));
            }
            Fault::Exit => process::exit(13),
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn null_pointer_write() {
    unsafe {
        std::arch::asm!("mov dword ptr [{0}], 0xabcd", in(reg) black_box(0usize), options(nostack));
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn null_pointer_write() {
    unsafe { std::ptr::write_volatile(black_box(0usize) as *mut i32, 0xabcd) }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn int_division_by_zero() {
    unsafe {
        std::arch::asm!(
            "div {0:e}",
            in(reg) black_box(0u32),
            inout("eax") 1u32 => _,
            inout("edx") 0u32 => _,
            options(nomem, nostack),
        );
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn int_division_by_zero() {
    black_box(1i32 / black_box(0i32));
}

fn exhaust_memory(block: usize) {
    loop {
        mem::forget(black_box(Vec::<u8>::with_capacity(block)));
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn debug_break() {
    unsafe { std::arch::asm!("int3", options(nomem, nostack)) }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn debug_break() {
    process::abort()
}

#[cfg(all(windows, target_env = "msvc"))]
fn invalid_crt_argument() {
    extern "C" {
        fn strcpy_s(dest: *mut std::ffi::c_char, size: usize, src: *const std::ffi::c_char) -> std::ffi::c_int;
    }
    unsafe {
        strcpy_s(std::ptr::null_mut(), 4, c"abc".as_ptr());
    }
}

#[cfg(not(all(windows, target_env = "msvc")))]
fn invalid_crt_argument() {
    panic!("invalid CRT argument")
}

#[cfg(all(windows, target_env = "msvc"))]
fn pure_virtual_call() {
    extern "C" {
        fn _purecall() -> std::ffi::c_int;
    }
    unsafe {
        _purecall();
    }
}

#[cfg(not(all(windows, target_env = "msvc")))]
fn pure_virtual_call() {
    process::abort()
}

#[allow(unconditional_recursion)]
fn overflow_stack(depth: u64) -> u64 {
    let frame = black_box([depth; 64]);
    overflow_stack(frame[0] + 1) + frame[63]
}
