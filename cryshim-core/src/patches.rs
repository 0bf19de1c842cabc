//! Version-specific fix-ups applied to the running host.
//!
//! Only the selection lives here; writing process memory is left to the
//! launcher binary.

use cryshim_abi::WordSize;

use crate::builds::BuildInfo;
use crate::mode::ModeFlags;

/// Build whose dedicated server needs the timer fix.
pub const TIMER_PATCH_BUILD: u32 = 6729;

/// Warping lag fix for the Crysis Wars 1.5 dedicated server.
///
/// `timer_slot` is an absolute address inside the loaded CryRenderNULL module
/// that holds a pointer to the timer object; `value` is stored at
/// `*timer_slot + value_offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerPatch {
    pub timer_slot: usize,
    pub value_offset: usize,
    pub value: i64,
}

const TIMER_VALUE: i64 = 3_000_000_000_000;

pub fn timer_patch(build: &BuildInfo, mode: ModeFlags) -> Option<TimerPatch> {
    if build.build() != TIMER_PATCH_BUILD || !mode.is_dedicated() {
        return None;
    }
    let (timer_slot, value_offset) = match build.identity.word_size {
        // CryRenderNULL.dll+0xC8924
        WordSize::Bits32 => (0x380C_8924, 0x18),
        // CryRenderNULL.dll+0xBC0E8
        WordSize::Bits64 => (0x380B_C0E8, 0x20),
    };
    Some(TimerPatch { timer_slot, value_offset, value: TIMER_VALUE })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::{classify, BuildIdentity};

    fn info(build: u32, word_size: WordSize) -> BuildInfo {
        classify(BuildIdentity::new(build, word_size)).unwrap()
    }

    #[test]
    fn only_the_last_wars_build_in_server_mode() {
        assert!(timer_patch(&info(6729, WordSize::Bits32), ModeFlags::empty()).is_none());
        assert!(timer_patch(&info(6670, WordSize::Bits32), ModeFlags::DEDICATED).is_none());
        assert!(timer_patch(&info(6156, WordSize::Bits64), ModeFlags::DEDICATED).is_none());
        assert!(timer_patch(&info(6729, WordSize::Bits64), ModeFlags::DEDICATED).is_some());
    }

    #[test]
    fn addresses_per_width() {
        let patch = timer_patch(&info(6729, WordSize::Bits32), ModeFlags::DEDICATED).unwrap();
        assert_eq!(patch, TimerPatch { timer_slot: 0x380C8924, value_offset: 0x18, value: 3_000_000_000_000 });

        let patch = timer_patch(&info(6729, WordSize::Bits64), ModeFlags::DEDICATED).unwrap();
        assert_eq!((patch.timer_slot, patch.value_offset), (0x380BC0E8, 0x20));
    }
}
