#![forbid(unsafe_code)]

/// Registry v1: role-gated keyed record store for buildings, energy
/// readings, maintenance tasks, occupancy spaces and building systems.
///
/// Part of the canonical hash. Behavioral changes require a new version.
pub const REGISTRY_VERSION: u32 = 1;

pub mod arithmetic;
pub mod collection;
pub mod context;
pub mod domain;
pub mod engine;
pub mod error;
pub mod events;
pub mod hashing;
pub mod invariants;
pub mod queries;
pub mod transitions;

pub use context::CallContext;
pub use domain::{Principal, ReadingKey, RegistryConfig, RegistryState, ScopedKey};
pub use engine::{EngineError, Receipt, Registry};
pub use error::RegistryError;
pub use events::{Command, CommandEnvelope};
