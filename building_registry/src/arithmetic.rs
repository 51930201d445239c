/// Building Registry v1: Arithmetic and Identifiers
///
/// Pure integer math. No float.

use crate::error::{RegistryError, Result};

/// Integer percentage `part * 100 / whole`, floored.
/// A zero `whole` is rejected rather than divided by.
pub fn percentage(part: u64, whole: u64) -> Result<u64> {
    if whole == 0 {
        return Err(RegistryError::invalid("percentage of zero capacity"));
    }
    let scaled = part
        .checked_mul(100)
        .ok_or_else(|| RegistryError::invalid(format!("overflow: {} * 100", part)))?;
    Ok(scaled / whole)
}

/// Heights from `since` to `current`, saturating at 0.
pub fn elapsed(current: u64, since: u64) -> u64 {
    current.saturating_sub(since)
}

/// Keys and principals are opaque; the only malformed one is empty.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
}

pub fn validate_identifier(kind: &str, id: &str) -> Result<()> {
    if is_valid_identifier(id) {
        Ok(())
    } else {
        Err(RegistryError::invalid(format!("{} must not be empty", kind)))
    }
}
