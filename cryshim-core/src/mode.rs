use bitflags::bitflags;
use cryshim_abi::InitParams;
use serde::{Deserialize, Serialize};

use crate::cmdline::CmdLine;

bitflags! {
    /// How the host is started. Each flag maps onto one boolean of the init
    /// record.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ModeFlags: u32 {
        const EDITOR = 1 << 0;
        const MINIMAL = 1 << 1;
        const TESTING = 1 << 2;
        const DEDICATED = 1 << 3;
    }
}

pub const GAME_LOG_FILE: &str = "Game.log";
pub const SERVER_LOG_FILE: &str = "Server.log";

impl Default for ModeFlags {
    fn default() -> Self {
        ModeFlags::empty()
    }
}

impl ModeFlags {
    pub fn from_cmdline(cmdline: &CmdLine) -> Self {
        let mut mode = ModeFlags::empty();
        mode.set(ModeFlags::DEDICATED, cmdline.has_arg("dedicated"));
        mode
    }

    pub fn is_dedicated(self) -> bool {
        self.contains(ModeFlags::DEDICATED)
    }

    pub fn apply(self, params: &mut InitParams) {
        params.editor = self.contains(ModeFlags::EDITOR);
        params.minimal = self.contains(ModeFlags::MINIMAL);
        params.testing = self.contains(ModeFlags::TESTING);
        params.dedicated_server = self.contains(ModeFlags::DEDICATED);
    }

    pub fn default_log_file(self) -> &'static str {
        if self.is_dedicated() {
            SERVER_LOG_FILE
        } else {
            GAME_LOG_FILE
        }
    }
}
