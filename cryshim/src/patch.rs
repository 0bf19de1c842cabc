use std::ptr;

use cryshim_core::patches::TimerPatch;
use log::{info, warn};

/// Writes the timer value into the live host.
///
/// # Safety
/// `patch.timer_slot` must be readable and, when it holds a non-null
/// pointer, `pointer + value_offset` must be a writable `i64`.
pub unsafe fn apply_timer_patch(patch: &TimerPatch) -> bool {
    let timer = ptr::read_volatile(patch.timer_slot as *const usize);
    if timer == 0 {
        warn!("Timer patch skipped: no timer at {:#x}", patch.timer_slot);
        return false;
    }
    ptr::write_unaligned((timer + patch.value_offset) as *mut i64, patch.value);
    info!("Timer patch applied at {:#x}", timer + patch.value_offset);
    true
}
