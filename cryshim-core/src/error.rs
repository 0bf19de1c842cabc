use std::path::PathBuf;

use cryshim_abi::{ParamsError, WordSize};
use thiserror::Error;

use crate::builds::Product;
use crate::sequencer::BootState;

/// Everything that stops the bootstrap. None of these is retried: a missing
/// file, an unknown binary or a host that refuses to start will not fix
/// itself.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("Failed to load {}: {reason}", path.display())]
    ModuleLoad { path: PathBuf, reason: String },

    #[error("The {module} module is not valid! (missing export {symbol})")]
    SymbolNotFound { module: String, symbol: String },

    #[error("Unknown game build {build} ({word_size})")]
    UnknownBuild { build: u32, word_size: WordSize },

    #[error("{product} is not supported! (build {build})")]
    UnsupportedVariant { product: Product, build: u32 },

    #[error("Game initialization failed! ({0})")]
    InitializationFailed(String),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("Bootstrap aborted: {0}")]
    Aborted(String),

    #[error("cannot {operation} while {state}")]
    InvalidState { state: BootState, operation: &'static str },

    #[error("Invalid launcher configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BootError>;
