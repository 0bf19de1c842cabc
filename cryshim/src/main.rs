use std::process;

use cryshim::launcher::{self, Launcher};

fn main() {
    let result = Launcher::from_env().and_then(Launcher::run);
    process::exit(launcher::exit_code(result))
}
