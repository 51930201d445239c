//! Session manager: isolated in-memory registries with an accepted-command
//! history.
//!
//! Each session owns one engine and the ordered list of commands it
//! accepted. Nothing is written to disk.
//! Concurrency: `SharedSession` serializes writers with a Mutex; no
//! global mutable state.
//!
//! Submit order:
//!   1. engine.apply(envelope)   (rejections stop here, nothing recorded)
//!   2. history.push(envelope)   (only accepted commands)

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use building_registry::hashing::canonical_hash;
use building_registry::{
    Command, CommandEnvelope, Principal, Receipt, Registry, RegistryConfig, RegistryState,
};

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::replay;

pub struct Session {
    session_id: String,
    registry: Registry,
    history: Vec<CommandEnvelope>,
}

impl Session {
    /// Fresh, empty session.
    pub fn new(session_id: &str, config: RegistryConfig) -> Self {
        info!(session = session_id, admin = %config.admin, "session created");
        Self {
            session_id: session_id.to_string(),
            registry: Registry::new(config),
            history: Vec::new(),
        }
    }

    pub fn with_config(config: &RuntimeConfig, session_id: &str) -> Self {
        Self::new(session_id, config.registry_config())
    }

    /// Issue `command` as `caller` at `height` with the next sequence.
    pub fn submit(
        &mut self,
        caller: impl Into<Principal>,
        height: u64,
        command: Command,
    ) -> Result<Receipt> {
        let sequence = self.registry.last_sequence() + 1;
        let envelope = CommandEnvelope::new(sequence, height, caller, command);
        self.apply_envelope(&envelope)
    }

    /// Apply a fully formed envelope and record it if accepted.
    pub fn apply_envelope(&mut self, envelope: &CommandEnvelope) -> Result<Receipt> {
        let receipt = self.registry.apply(envelope)?;
        self.history.push(envelope.clone());
        debug!(
            session = %self.session_id,
            sequence = receipt.sequence,
            command = receipt.command,
            "command recorded"
        );
        Ok(receipt)
    }

    /// Discard the live state and rebuild it from the history.
    pub fn replay_full(&mut self) -> Result<(RegistryState, String)> {
        let (state, hash) = replay::rebuild_state(self.registry.config(), &self.history)?;
        self.registry.replay(&self.history)?;
        Ok((state, hash))
    }

    /// Accepted commands in sequence order.
    pub fn history(&self) -> &[CommandEnvelope] {
        &self.history
    }

    pub fn state(&self) -> &RegistryState {
        self.registry.state()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(self.registry.state())
    }

    pub fn current_sequence(&self) -> u64 {
        self.registry.last_sequence()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Thread-safe session handle.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit(&self, caller: impl Into<Principal>, height: u64, command: Command) -> Result<Receipt> {
        self.lock().submit(caller, height, command)
    }

    pub fn current_hash(&self) -> String {
        self.lock().current_hash()
    }

    pub fn current_sequence(&self) -> u64 {
        self.lock().current_sequence()
    }

    /// Run a read-only closure against the state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
        f(self.lock().state())
    }

    /// Copy of the accepted history, taken under the lock.
    pub fn history(&self) -> Vec<CommandEnvelope> {
        self.lock().history().to_vec()
    }
}
