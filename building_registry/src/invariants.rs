/// Building Registry v1: Invariant Checks
///
/// Run by the engine after every transition.
/// Returns the first violation as a tagged message.

use crate::arithmetic::is_valid_identifier;
use crate::domain::RegistryState;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run all checks. `Err(message)` on the first failure.
pub fn try_validate_invariants(state: &RegistryState) -> Result<(), String> {
    try_check_identifier_format(state)?;
    try_check_verification_dates(state)?;
    try_check_completion_dates(state)?;
    try_check_occupancy_within_capacity(state)?;
    try_check_maintenance_not_before_installation(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn try_check_identifier_format(state: &RegistryState) -> Result<(), String> {
    let bad = |what: &str, id: &str| {
        Err(format!(
            "[INVARIANT:identifier_format] {} {:?} must not be empty",
            what, id
        ))
    };

    for (id, building) in &state.buildings {
        if !is_valid_identifier(id) {
            return bad("building id", id);
        }
        if !is_valid_identifier(building.owner.as_str()) {
            return bad("owner", building.owner.as_str());
        }
    }
    for key in state.energy_readings.keys() {
        if !is_valid_identifier(&key.building_id) {
            return bad("building id", &key.building_id);
        }
    }
    for (key, task) in &state.maintenance_tasks {
        if !is_valid_identifier(&key.building_id) || !is_valid_identifier(&key.item_id) {
            return bad("task key", &key.to_string());
        }
        if !is_valid_identifier(task.assigned_to.as_str()) {
            return bad("assignee", task.assigned_to.as_str());
        }
    }
    for key in state.spaces.keys().chain(state.systems.keys()) {
        if !is_valid_identifier(&key.building_id) || !is_valid_identifier(&key.item_id) {
            return bad("record key", &key.to_string());
        }
    }
    Ok(())
}

/// An unverified building carries no verification date.
fn try_check_verification_dates(state: &RegistryState) -> Result<(), String> {
    for (id, b) in &state.buildings {
        if !b.verified && b.verification_date != 0 {
            return Err(format!(
                "[INVARIANT:verification_date] Building {:?} is unverified but has verification_date={}",
                id, b.verification_date
            ));
        }
    }
    Ok(())
}

/// An open task carries no completion date.
fn try_check_completion_dates(state: &RegistryState) -> Result<(), String> {
    for (key, t) in &state.maintenance_tasks {
        if !t.completed && t.completion_date != 0 {
            return Err(format!(
                "[INVARIANT:completion_date] Task {} is open but has completion_date={}",
                key, t.completion_date
            ));
        }
    }
    Ok(())
}

/// 0 < capacity and current_occupancy <= capacity.
fn try_check_occupancy_within_capacity(state: &RegistryState) -> Result<(), String> {
    for (key, s) in &state.spaces {
        if s.capacity == 0 {
            return Err(format!(
                "[INVARIANT:space_capacity] Space {} has zero capacity",
                key
            ));
        }
        if s.current_occupancy > s.capacity {
            return Err(format!(
                "[INVARIANT:occupancy_capacity] Space {} occupancy {} exceeds capacity {}",
                key, s.current_occupancy, s.capacity
            ));
        }
    }
    Ok(())
}

fn try_check_maintenance_not_before_installation(state: &RegistryState) -> Result<(), String> {
    for (key, s) in &state.systems {
        if s.last_maintenance < s.installation_date {
            return Err(format!(
                "[INVARIANT:maintenance_order] System {} last_maintenance={} precedes installation_date={}",
                key, s.last_maintenance, s.installation_date
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Building, BuildingSystem, MaintenanceTask, Principal, ScopedKey, Space};

    fn building(owner: &str) -> Building {
        Building {
            owner: Principal::from(owner),
            address: "1 Harbour Rd".into(),
            square_footage: 5000,
            verified: false,
            verification_date: 0,
        }
    }

    #[test]
    fn empty_state_is_valid() {
        assert!(try_validate_invariants(&RegistryState::default()).is_ok());
    }

    #[test]
    fn occupancy_over_capacity_is_reported() {
        let mut state = RegistryState::default();
        state.spaces.insert_new(
            ScopedKey::new("building1", "space1"),
            Space {
                space_name: "Conference Room A".into(),
                capacity: 20,
                current_occupancy: 25,
                last_updated: 100,
            },
        );
        let msg = try_validate_invariants(&state).unwrap_err();
        assert!(msg.contains("occupancy_capacity"), "{}", msg);
    }

    #[test]
    fn open_task_with_completion_date_is_reported() {
        let mut state = RegistryState::default();
        state.maintenance_tasks.insert_new(
            ScopedKey::new("building1", "task1"),
            MaintenanceTask {
                system_id: "system1".into(),
                description: "Replace air filters".into(),
                scheduled_date: 120,
                completed: false,
                completion_date: 100,
                assigned_to: Principal::from("ST2"),
            },
        );
        let msg = try_validate_invariants(&state).unwrap_err();
        assert!(msg.contains("completion_date"), "{}", msg);
    }

    #[test]
    fn maintenance_before_installation_is_reported() {
        let mut state = RegistryState::default();
        state.systems.insert_new(
            ScopedKey::new("building1", "system1"),
            BuildingSystem {
                system_type: "HVAC".into(),
                manufacturer: "Carrier".into(),
                model: "Model X".into(),
                installation_date: 50,
                last_maintenance: 10,
            },
        );
        let msg = try_validate_invariants(&state).unwrap_err();
        assert!(msg.contains("maintenance_order"), "{}", msg);
    }

    #[test]
    fn free_form_identifiers_are_valid() {
        let mut state = RegistryState::default();
        state
            .buildings
            .insert_new("Building 1".to_string(), building("ops@acme.example"));
        assert!(try_validate_invariants(&state).is_ok());
    }

    #[test]
    fn empty_owner_is_reported() {
        let mut state = RegistryState::default();
        state.buildings.insert_new("building1".to_string(), building(""));
        let msg = try_validate_invariants(&state).unwrap_err();
        assert!(msg.contains("identifier_format"), "{}", msg);
    }
}
