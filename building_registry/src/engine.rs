/// Building Registry v1: Engine
///
/// Stateful wrapper over the pure transition layer. Enforces schema
/// version, strict sequence and non-decreasing height, then validates
/// invariants before committing. A failed command changes nothing,
/// including the sequence counter.

use thiserror::Error;
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::domain::{Principal, RegistryConfig, RegistryState};
use crate::error::RegistryError;
use crate::events::{CommandEnvelope, SCHEMA_VERSION};
use crate::invariants::try_validate_invariants;
use crate::transitions::apply_command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersion { expected: u32, got: u32 },

    #[error("sequence violation: expected {expected}, got {got}")]
    Sequence { expected: u64, got: u64 },

    #[error("height regression: last applied height {last}, got {got}")]
    HeightRegression { last: u64, got: u64 },

    #[error("command rejected: {0}")]
    Rejected(#[from] RegistryError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    /// The registry-level failure, if the command itself was refused.
    pub fn registry_error(&self) -> Option<&RegistryError> {
        match self {
            EngineError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of an accepted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub sequence: u64,
    pub height: u64,
    pub command: &'static str,
}

pub struct Registry {
    config: RegistryConfig,
    state: RegistryState,
    last_sequence: u64,
    last_height: u64,
}

impl Registry {
    /// Fresh, empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: RegistryState::default(),
            last_sequence: 0,
            last_height: 0,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn admin(&self) -> &Principal {
        &self.config.admin
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn last_height(&self) -> u64 {
        self.last_height
    }

    /// Context for a call by `caller` at `height` under this registry's admin.
    pub fn context_for(&self, caller: &Principal, height: u64) -> CallContext {
        CallContext {
            admin: self.config.admin.clone(),
            caller: caller.clone(),
            height,
        }
    }

    /// Apply a single command envelope:
    ///   1. schema version must be 1
    ///   2. sequence must be last + 1
    ///   3. height must not go backward
    ///   4. transition on a copy of the state
    ///   5. invariants on the copy
    ///   6. commit
    pub fn apply(&mut self, envelope: &CommandEnvelope) -> Result<Receipt, EngineError> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersion {
                expected: SCHEMA_VERSION,
                got: envelope.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(EngineError::Sequence {
                expected,
                got: envelope.sequence,
            });
        }

        if envelope.height < self.last_height {
            return Err(EngineError::HeightRegression {
                last: self.last_height,
                got: envelope.height,
            });
        }

        let ctx = self.context_for(&envelope.caller, envelope.height);
        let mut next = self.state.clone();
        if let Err(err) = apply_command(&mut next, &ctx, &envelope.command) {
            warn!(
                sequence = envelope.sequence,
                command = envelope.command.name(),
                caller = %envelope.caller,
                code = err.status_code(),
                "command rejected: {}",
                err
            );
            return Err(err.into());
        }
        try_validate_invariants(&next).map_err(EngineError::InvariantViolation)?;

        self.state = next;
        self.last_sequence = envelope.sequence;
        self.last_height = envelope.height;
        debug!(
            sequence = envelope.sequence,
            height = envelope.height,
            command = envelope.command.name(),
            building = envelope.command.building_id(),
            "command applied"
        );

        Ok(Receipt {
            sequence: envelope.sequence,
            height: envelope.height,
            command: envelope.command.name(),
        })
    }

    /// Apply an ordered sequence, stopping at the first failure.
    pub fn apply_sequence(&mut self, envelopes: &[CommandEnvelope]) -> Result<&RegistryState, EngineError> {
        for envelope in envelopes {
            self.apply(envelope)?;
        }
        Ok(&self.state)
    }

    /// Reset to empty and replay.
    pub fn replay(&mut self, envelopes: &[CommandEnvelope]) -> Result<&RegistryState, EngineError> {
        self.state = RegistryState::default();
        self.last_sequence = 0;
        self.last_height = 0;
        self.apply_sequence(envelopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Command;

    const ADMIN: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    fn register(seq: u64, height: u64, id: &str) -> CommandEnvelope {
        CommandEnvelope::new(
            seq,
            height,
            ADMIN,
            Command::RegisterBuilding {
                building_id: id.into(),
                address: "123 Main St".into(),
                square_footage: 10000,
            },
        )
    }

    #[test]
    fn sequence_must_be_contiguous() {
        let mut reg = Registry::new(RegistryConfig::new(ADMIN));
        reg.apply(&register(1, 100, "building1")).unwrap();
        let err = reg.apply(&register(3, 100, "building2")).unwrap_err();
        assert_eq!(err, EngineError::Sequence { expected: 2, got: 3 });
    }

    #[test]
    fn height_must_not_regress() {
        let mut reg = Registry::new(RegistryConfig::new(ADMIN));
        reg.apply(&register(1, 100, "building1")).unwrap();
        let err = reg.apply(&register(2, 99, "building2")).unwrap_err();
        assert!(matches!(err, EngineError::HeightRegression { last: 100, got: 99 }));
        reg.apply(&register(2, 100, "building2")).unwrap();
    }

    #[test]
    fn schema_version_is_enforced() {
        let mut reg = Registry::new(RegistryConfig::new(ADMIN));
        let mut env = register(1, 100, "building1");
        env.schema_version = 99;
        assert!(matches!(
            reg.apply(&env),
            Err(EngineError::SchemaVersion { expected: 1, got: 99 })
        ));
    }

    #[test]
    fn rejection_does_not_consume_sequence() {
        let mut reg = Registry::new(RegistryConfig::new(ADMIN));
        let mut env = register(1, 100, "building1");
        env.caller = Principal::from("ST3PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM");
        let err = reg.apply(&env).unwrap_err();
        assert_eq!(err.registry_error().map(|e| e.status_code()), Some(403));
        assert_eq!(reg.last_sequence(), 0);
        assert_eq!(reg.last_height(), 0);

        reg.apply(&register(1, 100, "building1")).unwrap();
        assert_eq!(reg.last_sequence(), 1);
    }

    #[test]
    fn email_style_admin_can_register() {
        let admin = "ops@acme.example";
        let mut reg = Registry::new(RegistryConfig::new(admin));
        let env = CommandEnvelope::new(
            1,
            100,
            admin,
            Command::RegisterBuilding {
                building_id: "Building 1".into(),
                address: "1 Harbour Rd".into(),
                square_footage: 5000,
            },
        );
        let receipt = reg.apply(&env).unwrap();
        assert_eq!(receipt.sequence, 1);
        let building = reg.state().buildings.get("Building 1").unwrap();
        assert_eq!(building.owner.as_str(), admin);
    }
}
