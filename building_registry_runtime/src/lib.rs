#![forbid(unsafe_code)]

//! Building Registry runtime
//!
//! Wraps the registry kernel with in-memory sessions, replay and drift
//! detection. State lives only as long as the process.
//!
//! No domain logic lives here; transitions and invariants belong to
//! the kernel.

pub mod config;
pub mod drift;
pub mod error;
pub mod replay;
pub mod session;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use session::{Session, SharedSession};
