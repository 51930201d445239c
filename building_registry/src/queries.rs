/// Building Registry v1: Queries and Derived Values
///
/// No authorization and no mutation. Derived values take the current
/// height as an argument.

use crate::domain::{
    Building, BuildingSystem, EnergyReading, MaintenanceTask, ReadingKey, RegistryState,
    ScopedKey, Space, BUILDING, ENERGY_READING, MAINTENANCE_TASK, SPACE, SYSTEM,
};
use crate::error::{RegistryError, Result};

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

pub fn building_details<'a>(state: &'a RegistryState, building_id: &str) -> Result<&'a Building> {
    state
        .buildings
        .get(building_id)
        .ok_or_else(|| RegistryError::not_found(BUILDING, building_id))
}

pub fn is_building_verified(state: &RegistryState, building_id: &str) -> Result<bool> {
    building_details(state, building_id).map(|b| b.verified)
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Reading recorded for `building_id` at exactly `height`.
pub fn reading_at<'a>(
    state: &'a RegistryState,
    building_id: &str,
    height: u64,
) -> Result<&'a EnergyReading> {
    let key = ReadingKey::new(building_id, height);
    state
        .energy_readings
        .get(&key)
        .ok_or_else(|| RegistryError::not_found(ENERGY_READING, &key))
}

/// Most recent reading at or before `current_height`, with its height.
pub fn latest_reading<'a>(
    state: &'a RegistryState,
    building_id: &str,
    current_height: u64,
) -> Result<(u64, &'a EnergyReading)> {
    let lo = ReadingKey::new(building_id, 0);
    let hi = ReadingKey::new(building_id, current_height);
    state
        .energy_readings
        .range(lo..=hi)
        .next_back()
        .map(|(k, r)| (k.height, r))
        .ok_or_else(|| {
            RegistryError::not_found(
                ENERGY_READING,
                format!("{}@<={}", building_id, current_height),
            )
        })
}

pub fn is_optimization_active(state: &RegistryState, building_id: &str, height: u64) -> Result<bool> {
    reading_at(state, building_id, height).map(|r| r.optimization_active)
}

/// All readings for a building, oldest first.
pub fn readings_for_building<'a>(
    state: &'a RegistryState,
    building_id: &str,
) -> Vec<(u64, &'a EnergyReading)> {
    let lo = ReadingKey::new(building_id, 0);
    let hi = ReadingKey::new(building_id, u64::MAX);
    state
        .energy_readings
        .range(lo..=hi)
        .map(|(k, r)| (k.height, r))
        .collect()
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

pub fn task_details<'a>(state: &'a RegistryState, key: &ScopedKey) -> Result<&'a MaintenanceTask> {
    state
        .maintenance_tasks
        .get(key)
        .ok_or_else(|| RegistryError::not_found(MAINTENANCE_TASK, key))
}

pub fn is_task_overdue(state: &RegistryState, key: &ScopedKey, current_height: u64) -> Result<bool> {
    task_details(state, key).map(|t| t.is_overdue(current_height))
}

/// Tasks of one building in task-id order.
pub fn tasks_for_building<'a>(
    state: &'a RegistryState,
    building_id: &str,
) -> Vec<(&'a str, &'a MaintenanceTask)> {
    state
        .maintenance_tasks
        .range(ScopedKey::new(building_id, "")..)
        .take_while(|(k, _)| k.building_id == building_id)
        .map(|(k, t)| (k.item_id.as_str(), t))
        .collect()
}

pub fn overdue_tasks<'a>(
    state: &'a RegistryState,
    building_id: &str,
    current_height: u64,
) -> Vec<&'a str> {
    tasks_for_building(state, building_id)
        .into_iter()
        .filter(|(_, t)| t.is_overdue(current_height))
        .map(|(id, _)| id)
        .collect()
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

pub fn space_details<'a>(state: &'a RegistryState, key: &ScopedKey) -> Result<&'a Space> {
    state
        .spaces
        .get(key)
        .ok_or_else(|| RegistryError::not_found(SPACE, key))
}

pub fn occupancy_percentage(state: &RegistryState, key: &ScopedKey) -> Result<u64> {
    space_details(state, key)?.occupancy_percentage()
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn system_details<'a>(state: &'a RegistryState, key: &ScopedKey) -> Result<&'a BuildingSystem> {
    state
        .systems
        .get(key)
        .ok_or_else(|| RegistryError::not_found(SYSTEM, key))
}

/// Heights elapsed since the system was last maintained.
pub fn maintenance_status(state: &RegistryState, key: &ScopedKey, current_height: u64) -> Result<u64> {
    system_details(state, key).map(|s| s.heights_since_maintenance(current_height))
}
