//! Replay orchestrator: rebuild state from a command stream.
//!
//! All domain logic is delegated to the kernel engine. No cached state.

use building_registry::hashing::canonical_hash;
use building_registry::{CommandEnvelope, EngineError, Registry, RegistryConfig, RegistryState};

/// Fresh engine, apply every command in order, return the final state
/// and its canonical hash. Stops at the first rejected command.
pub fn rebuild_state(
    config: &RegistryConfig,
    commands: &[CommandEnvelope],
) -> Result<(RegistryState, String), EngineError> {
    let mut registry = Registry::new(config.clone());
    let state = registry.apply_sequence(commands)?;
    let hash = canonical_hash(state);
    Ok((state.clone(), hash))
}

pub fn rebuild_hash(config: &RegistryConfig, commands: &[CommandEnvelope]) -> Result<String, EngineError> {
    rebuild_state(config, commands).map(|(_, hash)| hash)
}
