//! Runtime error type.

use std::io;

use thiserror::Error;

use building_registry::EngineError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("replay is not deterministic: {first} != {second}")]
    Nondeterministic { first: String, second: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
