/// Building Registry v1: Core Domain Types
///
/// Records and keys only. Mutation lives in `transitions`.
/// All quantities are unsigned integers except temperature.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arithmetic::{elapsed, percentage};
use crate::collection::Collection;
use crate::error::Result;

// ── Collection names (used in error messages) ─────────────────────

pub const BUILDING: &str = "building";
pub const ENERGY_READING: &str = "energy reading";
pub const MAINTENANCE_TASK: &str = "maintenance task";
pub const SPACE: &str = "space";
pub const SYSTEM: &str = "system";

// ── Identity ──────────────────────────────────────────────────────

/// Opaque identity of an acting party (admin, owner, assignee, caller).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Composite keys ────────────────────────────────────────────────

/// Record scoped to a building: tasks, spaces and systems.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopedKey {
    pub building_id: String,
    pub item_id: String,
}

impl ScopedKey {
    pub fn new(building_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            building_id: building_id.into(),
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.building_id, self.item_id)
    }
}

/// Energy reading slot: one per building per height.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadingKey {
    pub building_id: String,
    pub height: u64,
}

impl ReadingKey {
    pub fn new(building_id: impl Into<String>, height: u64) -> Self {
        Self {
            building_id: building_id.into(),
            height,
        }
    }
}

impl fmt::Display for ReadingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.building_id, self.height)
    }
}

// ── Records ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Building {
    pub owner: Principal,
    pub address: String,
    pub square_footage: u64,
    pub verified: bool,
    pub verification_date: u64, // 0 until verified
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnergyReading {
    pub electricity_kwh: u64,
    pub gas_therms: u64,
    pub water_gallons: u64,
    pub temperature: i64,
    pub optimization_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaintenanceTask {
    pub system_id: String,
    pub description: String,
    pub scheduled_date: u64,
    pub completed: bool,
    pub completion_date: u64, // 0 until completed
    pub assigned_to: Principal,
}

impl MaintenanceTask {
    /// Not completed and the scheduled height has passed.
    pub fn is_overdue(&self, current_height: u64) -> bool {
        !self.completed && current_height > self.scheduled_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Space {
    pub space_name: String,
    pub capacity: u64,
    pub current_occupancy: u64,
    pub last_updated: u64,
}

impl Space {
    /// `current_occupancy * 100 / capacity`, floored.
    pub fn occupancy_percentage(&self) -> Result<u64> {
        percentage(self.current_occupancy, self.capacity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingSystem {
    pub system_type: String,
    pub manufacturer: String,
    pub model: String,
    pub installation_date: u64,
    pub last_maintenance: u64,
}

impl BuildingSystem {
    /// Heights elapsed since the last maintenance; 0 if it lies ahead.
    pub fn heights_since_maintenance(&self, current_height: u64) -> u64 {
        elapsed(current_height, self.last_maintenance)
    }
}

// ── State ─────────────────────────────────────────────────────────

/// All five collections. Each is independent of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryState {
    pub buildings: Collection<String, Building>,
    pub energy_readings: Collection<ReadingKey, EnergyReading>,
    pub maintenance_tasks: Collection<ScopedKey, MaintenanceTask>,
    pub spaces: Collection<ScopedKey, Space>,
    pub systems: Collection<ScopedKey, BuildingSystem>,
}

impl RegistryState {
    pub fn record_count(&self) -> usize {
        self.buildings.len()
            + self.energy_readings.len()
            + self.maintenance_tasks.len()
            + self.spaces.len()
            + self.systems.len()
    }
}

/// Process-wide settings injected into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    pub admin: Principal,
}

impl RegistryConfig {
    pub fn new(admin: impl Into<Principal>) -> Self {
        Self {
            admin: admin.into(),
        }
    }
}
