//! Runtime configuration.
//!
//! Loaded from a JSON file, then overridden by environment variables:
//!   BUILDING_REGISTRY_ADMIN

use std::fs;
use std::path::Path;

use serde::Deserialize;

use building_registry::{Principal, RegistryConfig};

use crate::error::{Result, RuntimeError};

pub const ENV_ADMIN: &str = "BUILDING_REGISTRY_ADMIN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub admin: Principal,
}

impl RuntimeConfig {
    pub fn new(admin: impl Into<Principal>) -> Self {
        Self { admin: admin.into() }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| RuntimeError::Config(e.to_string()))?;
        cfg.validated()
    }

    /// Read a JSON file and apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)?.with_env_overrides()
    }

    /// Build entirely from the environment. The admin is required.
    pub fn from_env() -> Result<Self> {
        let admin = std::env::var(ENV_ADMIN)
            .map_err(|_| RuntimeError::Config(format!("{} is not set", ENV_ADMIN)))?;
        Self::new(admin).validated()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(admin) = lookup(ENV_ADMIN) {
            self.admin = Principal::from(admin);
        }
        self.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.admin.as_str().is_empty() {
            return Err(RuntimeError::Config("admin must not be empty".to_string()));
        }
        Ok(self)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            admin: self.admin.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_read_from_json() {
        let cfg = RuntimeConfig::from_json_str(r#"{"admin":"ops@acme.example"}"#).unwrap();
        assert_eq!(cfg.admin.as_str(), "ops@acme.example");
        assert_eq!(cfg.registry_config().admin.as_str(), "ops@acme.example");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RuntimeConfig::from_json_str(r#"{"admin":"ST1","data_dir":"/tmp"}"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn empty_admin_is_a_config_error() {
        let err = RuntimeConfig::from_json_str(r#"{"admin":""}"#).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn overrides_win() {
        let cfg = RuntimeConfig::new("ST1")
            .with_overrides(|key| (key == ENV_ADMIN).then(|| "ST9".to_string()))
            .unwrap();
        assert_eq!(cfg.admin.as_str(), "ST9");
        assert_eq!(cfg.registry_config().admin.as_str(), "ST9");
    }
}
