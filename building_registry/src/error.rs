/// Building Registry v1: Error Taxonomy
///
/// Four kinds, surfaced directly to the caller and never retried.
/// A failed call leaves the store unchanged.

use thiserror::Error;

use crate::domain::Principal;

/// Failure of a single registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Caller identity fails the operation's role check.
    #[error("forbidden: {caller} may not {action}")]
    Forbidden {
        caller: Principal,
        action: &'static str,
    },

    /// Referenced key is absent from its collection.
    #[error("{collection} {key} not found")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    /// Create operation targets a key that is already present.
    #[error("{collection} {key} already exists")]
    AlreadyExists {
        collection: &'static str,
        key: String,
    },

    /// A supplied value violates a field invariant.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RegistryError {
    pub fn not_found(collection: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            collection,
            key: key.to_string(),
        }
    }

    pub fn already_exists(collection: &'static str, key: impl ToString) -> Self {
        Self::AlreadyExists {
            collection,
            key: key.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// HTTP-style status code for the failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } => 409,
            Self::InvalidArgument(_) => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_http_convention() {
        let forbidden = RegistryError::Forbidden {
            caller: Principal::from("ST3"),
            action: "register building",
        };
        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(RegistryError::not_found("space", "b1/s1").status_code(), 404);
        assert_eq!(RegistryError::already_exists("space", "b1/s1").status_code(), 409);
        assert_eq!(RegistryError::invalid("occupancy").status_code(), 400);
    }

    #[test]
    fn messages_name_the_key() {
        let err = RegistryError::not_found("maintenance task", "building1/task9");
        assert_eq!(err.to_string(), "maintenance task building1/task9 not found");
    }
}
