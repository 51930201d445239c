/// Building Registry v1: Call Context
///
/// Admin, caller and current height travel with every mutating call.
/// The kernel holds no ambient identity or clock of its own.

use crate::domain::Principal;
use crate::error::{RegistryError, Result};

/// Identity and time supplied by the environment for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub admin: Principal,
    pub caller: Principal,
    pub height: u64,
}

impl CallContext {
    pub fn new(admin: impl Into<Principal>, caller: impl Into<Principal>, height: u64) -> Self {
        Self {
            admin: admin.into(),
            caller: caller.into(),
            height,
        }
    }

    /// Context where the caller is the admin.
    pub fn as_admin(admin: impl Into<Principal>, height: u64) -> Self {
        let admin = admin.into();
        Self {
            caller: admin.clone(),
            admin,
            height,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.caller == self.admin
    }

    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(self.forbidden(action))
        }
    }

    /// Caller must be exactly `party`; the admin gets no bypass.
    pub fn require_party(&self, party: &Principal, action: &'static str) -> Result<()> {
        if &self.caller == party {
            Ok(())
        } else {
            Err(self.forbidden(action))
        }
    }

    pub fn require_admin_or(&self, party: &Principal, action: &'static str) -> Result<()> {
        if self.is_admin() || &self.caller == party {
            Ok(())
        } else {
            Err(self.forbidden(action))
        }
    }

    fn forbidden(&self, action: &'static str) -> RegistryError {
        RegistryError::Forbidden {
            caller: self.caller.clone(),
            action,
        }
    }
}
