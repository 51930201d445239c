/// Building Registry v1: Centralized Transition Logic
///
/// ALL state mutation lives here. Every handler runs its checks before
/// its first write, so an `Err` leaves the state exactly as it was.
///
/// Check order: admin-gated operations authorize first, then look up
/// the record, then validate fields. Owner and assignee checks need the
/// record, so those look up first.

use crate::arithmetic::validate_identifier;
use crate::context::CallContext;
use crate::domain::{
    Building, BuildingSystem, EnergyReading, MaintenanceTask, Principal, ReadingKey,
    RegistryState, ScopedKey, Space, BUILDING, ENERGY_READING, MAINTENANCE_TASK, SPACE, SYSTEM,
};
use crate::error::{RegistryError, Result};
use crate::events::Command;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `command` to `state` under `ctx`.
pub fn apply_command(state: &mut RegistryState, ctx: &CallContext, command: &Command) -> Result<()> {
    match command {
        Command::RegisterBuilding {
            building_id,
            address,
            square_footage,
        } => register_building(state, ctx, building_id, address, *square_footage),
        Command::VerifyBuilding { building_id } => verify_building(state, ctx, building_id),
        Command::TransferOwnership {
            building_id,
            new_owner,
        } => transfer_ownership(state, ctx, building_id, new_owner),
        Command::RecordConsumption {
            building_id,
            electricity_kwh,
            gas_therms,
            water_gallons,
            temperature,
        } => record_consumption(
            state,
            ctx,
            building_id,
            *electricity_kwh,
            *gas_therms,
            *water_gallons,
            *temperature,
        ),
        Command::ToggleOptimization {
            building_id,
            reading_height,
            active,
        } => toggle_optimization(
            state,
            ctx,
            &ReadingKey::new(building_id.as_str(), *reading_height),
            *active,
        ),
        Command::ScheduleTask {
            building_id,
            task_id,
            system_id,
            description,
            scheduled_date,
            assigned_to,
        } => schedule_task(
            state,
            ctx,
            &ScopedKey::new(building_id.as_str(), task_id.as_str()),
            system_id,
            description,
            *scheduled_date,
            assigned_to,
        ),
        Command::CompleteTask {
            building_id,
            task_id,
        } => complete_task(state, ctx, &ScopedKey::new(building_id.as_str(), task_id.as_str())),
        Command::ReassignTask {
            building_id,
            task_id,
            new_assignee,
        } => reassign_task(
            state,
            ctx,
            &ScopedKey::new(building_id.as_str(), task_id.as_str()),
            new_assignee,
        ),
        Command::RegisterSpace {
            building_id,
            space_id,
            space_name,
            capacity,
        } => register_space(
            state,
            ctx,
            &ScopedKey::new(building_id.as_str(), space_id.as_str()),
            space_name,
            *capacity,
        ),
        Command::UpdateOccupancy {
            building_id,
            space_id,
            occupancy,
        } => update_occupancy(
            state,
            ctx,
            &ScopedKey::new(building_id.as_str(), space_id.as_str()),
            *occupancy,
        ),
        Command::RegisterSystem {
            building_id,
            system_id,
            system_type,
            manufacturer,
            model,
            installation_date,
        } => register_system(
            state,
            ctx,
            &ScopedKey::new(building_id.as_str(), system_id.as_str()),
            system_type,
            manufacturer,
            model,
            *installation_date,
        ),
        Command::UpdateMaintenance {
            building_id,
            system_id,
        } => update_maintenance(
            state,
            ctx,
            &ScopedKey::new(building_id.as_str(), system_id.as_str()),
        ),
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// Register a building owned by the (admin) caller, unverified.
pub fn register_building(
    state: &mut RegistryState,
    ctx: &CallContext,
    building_id: &str,
    address: &str,
    square_footage: u64,
) -> Result<()> {
    ctx.require_admin("register building")?;
    if state.buildings.contains_key(building_id) {
        return Err(RegistryError::already_exists(BUILDING, building_id));
    }
    validate_identifier("building id", building_id)?;

    state.buildings.insert_new(
        building_id.to_string(),
        Building {
            owner: ctx.caller.clone(),
            address: address.to_string(),
            square_footage,
            verified: false,
            verification_date: 0,
        },
    );
    Ok(())
}

pub fn verify_building(state: &mut RegistryState, ctx: &CallContext, building_id: &str) -> Result<()> {
    ctx.require_admin("verify building")?;
    let building = state
        .buildings
        .get_mut(building_id)
        .ok_or_else(|| RegistryError::not_found(BUILDING, building_id))?;
    if building.verified {
        return Err(RegistryError::invalid(format!(
            "building {} already verified at height {}",
            building_id, building.verification_date
        )));
    }

    building.verified = true;
    building.verification_date = ctx.height;
    Ok(())
}

/// Only the current owner may hand a building over.
pub fn transfer_ownership(
    state: &mut RegistryState,
    ctx: &CallContext,
    building_id: &str,
    new_owner: &Principal,
) -> Result<()> {
    let building = state
        .buildings
        .get_mut(building_id)
        .ok_or_else(|| RegistryError::not_found(BUILDING, building_id))?;
    ctx.require_party(&building.owner, "transfer building ownership")?;
    validate_identifier("owner", new_owner.as_str())?;

    building.owner = new_owner.clone();
    Ok(())
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Record a reading keyed by the building and the current height.
pub fn record_consumption(
    state: &mut RegistryState,
    ctx: &CallContext,
    building_id: &str,
    electricity_kwh: u64,
    gas_therms: u64,
    water_gallons: u64,
    temperature: i64,
) -> Result<()> {
    ctx.require_admin("record consumption")?;
    let key = ReadingKey::new(building_id, ctx.height);
    if state.energy_readings.contains_key(&key) {
        return Err(RegistryError::already_exists(ENERGY_READING, &key));
    }
    validate_identifier("building id", building_id)?;

    state.energy_readings.insert_new(
        key,
        EnergyReading {
            electricity_kwh,
            gas_therms,
            water_gallons,
            temperature,
            optimization_active: false,
        },
    );
    Ok(())
}

pub fn toggle_optimization(
    state: &mut RegistryState,
    ctx: &CallContext,
    key: &ReadingKey,
    active: bool,
) -> Result<()> {
    ctx.require_admin("toggle optimization")?;
    let reading = state
        .energy_readings
        .get_mut(key)
        .ok_or_else(|| RegistryError::not_found(ENERGY_READING, key))?;

    reading.optimization_active = active;
    Ok(())
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

pub fn schedule_task(
    state: &mut RegistryState,
    ctx: &CallContext,
    key: &ScopedKey,
    system_id: &str,
    description: &str,
    scheduled_date: u64,
    assigned_to: &Principal,
) -> Result<()> {
    ctx.require_admin("schedule task")?;
    if state.maintenance_tasks.contains_key(key) {
        return Err(RegistryError::already_exists(MAINTENANCE_TASK, key));
    }
    validate_scoped_key(key, "task id")?;
    validate_identifier("system id", system_id)?;
    validate_identifier("assignee", assigned_to.as_str())?;

    state.maintenance_tasks.insert_new(
        key.clone(),
        MaintenanceTask {
            system_id: system_id.to_string(),
            description: description.to_string(),
            scheduled_date,
            completed: false,
            completion_date: 0,
            assigned_to: assigned_to.clone(),
        },
    );
    Ok(())
}

/// Admin or the current assignee may complete a task, once.
pub fn complete_task(state: &mut RegistryState, ctx: &CallContext, key: &ScopedKey) -> Result<()> {
    let task = state
        .maintenance_tasks
        .get_mut(key)
        .ok_or_else(|| RegistryError::not_found(MAINTENANCE_TASK, key))?;
    ctx.require_admin_or(&task.assigned_to, "complete task")?;
    if task.completed {
        return Err(RegistryError::invalid(format!(
            "task {} already completed at height {}",
            key, task.completion_date
        )));
    }

    task.completed = true;
    task.completion_date = ctx.height;
    Ok(())
}

pub fn reassign_task(
    state: &mut RegistryState,
    ctx: &CallContext,
    key: &ScopedKey,
    new_assignee: &Principal,
) -> Result<()> {
    ctx.require_admin("reassign task")?;
    let task = state
        .maintenance_tasks
        .get_mut(key)
        .ok_or_else(|| RegistryError::not_found(MAINTENANCE_TASK, key))?;
    validate_identifier("assignee", new_assignee.as_str())?;

    task.assigned_to = new_assignee.clone();
    Ok(())
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

pub fn register_space(
    state: &mut RegistryState,
    ctx: &CallContext,
    key: &ScopedKey,
    space_name: &str,
    capacity: u64,
) -> Result<()> {
    ctx.require_admin("register space")?;
    if state.spaces.contains_key(key) {
        return Err(RegistryError::already_exists(SPACE, key));
    }
    validate_scoped_key(key, "space id")?;
    if capacity == 0 {
        return Err(RegistryError::invalid(format!(
            "space {} must have a non-zero capacity",
            key
        )));
    }

    state.spaces.insert_new(
        key.clone(),
        Space {
            space_name: space_name.to_string(),
            capacity,
            current_occupancy: 0,
            last_updated: ctx.height,
        },
    );
    Ok(())
}

pub fn update_occupancy(
    state: &mut RegistryState,
    ctx: &CallContext,
    key: &ScopedKey,
    occupancy: u64,
) -> Result<()> {
    ctx.require_admin("update occupancy")?;
    let space = state
        .spaces
        .get_mut(key)
        .ok_or_else(|| RegistryError::not_found(SPACE, key))?;
    if occupancy > space.capacity {
        return Err(RegistryError::invalid(format!(
            "occupancy {} exceeds capacity {} of space {}",
            occupancy, space.capacity, key
        )));
    }

    space.current_occupancy = occupancy;
    space.last_updated = ctx.height;
    Ok(())
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn register_system(
    state: &mut RegistryState,
    ctx: &CallContext,
    key: &ScopedKey,
    system_type: &str,
    manufacturer: &str,
    model: &str,
    installation_date: u64,
) -> Result<()> {
    ctx.require_admin("register system")?;
    if state.systems.contains_key(key) {
        return Err(RegistryError::already_exists(SYSTEM, key));
    }
    validate_scoped_key(key, "system id")?;

    state.systems.insert_new(
        key.clone(),
        BuildingSystem {
            system_type: system_type.to_string(),
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            installation_date,
            last_maintenance: installation_date,
        },
    );
    Ok(())
}

/// Stamp the system as maintained at the current height.
/// `last_maintenance` never moves backward.
pub fn update_maintenance(state: &mut RegistryState, ctx: &CallContext, key: &ScopedKey) -> Result<()> {
    ctx.require_admin("update maintenance")?;
    let system = state
        .systems
        .get_mut(key)
        .ok_or_else(|| RegistryError::not_found(SYSTEM, key))?;
    if ctx.height < system.last_maintenance {
        return Err(RegistryError::invalid(format!(
            "height {} is before last maintenance {} of system {}",
            ctx.height, system.last_maintenance, key
        )));
    }

    system.last_maintenance = ctx.height;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_scoped_key(key: &ScopedKey, item_kind: &str) -> Result<()> {
    validate_identifier("building id", &key.building_id)?;
    validate_identifier(item_kind, &key.item_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
    const OTHER: &str = "ST3PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    fn admin(height: u64) -> CallContext {
        CallContext::as_admin(ADMIN, height)
    }

    #[test]
    fn admin_gated_checks_authorization_before_existence() {
        let mut state = RegistryState::default();
        let ctx = CallContext::new(ADMIN, OTHER, 100);
        let err = verify_building(&mut state, &ctx, "missing").unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn owner_gated_checks_existence_before_authorization() {
        let mut state = RegistryState::default();
        let ctx = CallContext::new(ADMIN, OTHER, 100);
        let err = transfer_ownership(&mut state, &ctx, "missing", &Principal::from(ADMIN))
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn empty_identifier_is_rejected_without_write() {
        let mut state = RegistryState::default();
        let err = register_building(&mut state, &admin(1), "", "x", 1).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
        assert!(state.buildings.is_empty());
    }

    #[test]
    fn free_form_identifiers_are_accepted() {
        let mut state = RegistryState::default();
        register_building(&mut state, &admin(1), "Building 1", "x", 1).unwrap();
        let key = ScopedKey::new("Building 1", "room #2");
        register_space(&mut state, &admin(1), &key, "Room", 4).unwrap();
        assert!(state.spaces.contains_key(&key));
    }

    #[test]
    fn duplicate_create_reports_conflict_before_field_errors() {
        let mut state = RegistryState::default();
        let space = ScopedKey::new("building1", "space1");
        register_space(&mut state, &admin(1), &space, "Lobby", 20).unwrap();
        let err = register_space(&mut state, &admin(2), &space, "Lobby", 0).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }), "{:?}", err);
        assert_eq!(state.spaces.get(&space).unwrap().capacity, 20);

        let task = ScopedKey::new("building1", "task1");
        let tech = Principal::from(OTHER);
        schedule_task(&mut state, &admin(1), &task, "hvac1", "Filters", 200, &tech).unwrap();
        let err = schedule_task(&mut state, &admin(2), &task, "", "Filters", 200, &Principal::from(""))
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(state.maintenance_tasks.get(&task).unwrap().assigned_to, tech);
    }

    #[test]
    fn zero_capacity_space_is_rejected() {
        let mut state = RegistryState::default();
        let key = ScopedKey::new("building1", "closet");
        let err = register_space(&mut state, &admin(1), &key, "Closet", 0).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(state.spaces.is_empty());
    }

    #[test]
    fn duplicate_reading_at_same_height_is_rejected() {
        let mut state = RegistryState::default();
        record_consumption(&mut state, &admin(100), "building1", 1000, 50, 2000, 72).unwrap();
        let err =
            record_consumption(&mut state, &admin(100), "building1", 1, 1, 1, 1).unwrap_err();
        assert_eq!(err.status_code(), 409);
        let key = ReadingKey::new("building1", 100);
        assert_eq!(state.energy_readings.get(&key).unwrap().electricity_kwh, 1000);
    }

    #[test]
    fn maintenance_never_moves_backward() {
        let mut state = RegistryState::default();
        let key = ScopedKey::new("building1", "system1");
        register_system(&mut state, &admin(10), &key, "HVAC", "Carrier", "Model X", 50).unwrap();
        let err = update_maintenance(&mut state, &admin(40), &key).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(state.systems.get(&key).unwrap().last_maintenance, 50);
        update_maintenance(&mut state, &admin(50), &key).unwrap();
    }

    #[test]
    fn dispatcher_routes_commands() {
        let mut state = RegistryState::default();
        let cmd = Command::RegisterSpace {
            building_id: "building1".into(),
            space_id: "space1".into(),
            space_name: "Conference Room A".into(),
            capacity: 20,
        };
        apply_command(&mut state, &admin(100), &cmd).unwrap();
        let space = state.spaces.get(&ScopedKey::new("building1", "space1")).unwrap();
        assert_eq!(space.capacity, 20);
        assert_eq!(space.last_updated, 100);
    }
}
