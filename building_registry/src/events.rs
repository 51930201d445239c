/// Building Registry v1: Command Definitions
///
/// Commands are pure data: intent and payload, no transition logic.
/// Schema version is locked at 1; the engine rejects anything else.

use serde::{Deserialize, Serialize};

use crate::domain::Principal;

pub const SCHEMA_VERSION: u32 = 1;

/// One mutating registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    RegisterBuilding {
        building_id: String,
        address: String,
        square_footage: u64,
    },
    VerifyBuilding {
        building_id: String,
    },
    TransferOwnership {
        building_id: String,
        new_owner: Principal,
    },
    RecordConsumption {
        building_id: String,
        electricity_kwh: u64,
        gas_therms: u64,
        water_gallons: u64,
        temperature: i64,
    },
    ToggleOptimization {
        building_id: String,
        reading_height: u64,
        active: bool,
    },
    ScheduleTask {
        building_id: String,
        task_id: String,
        system_id: String,
        description: String,
        scheduled_date: u64,
        assigned_to: Principal,
    },
    CompleteTask {
        building_id: String,
        task_id: String,
    },
    ReassignTask {
        building_id: String,
        task_id: String,
        new_assignee: Principal,
    },
    RegisterSpace {
        building_id: String,
        space_id: String,
        space_name: String,
        capacity: u64,
    },
    UpdateOccupancy {
        building_id: String,
        space_id: String,
        occupancy: u64,
    },
    RegisterSystem {
        building_id: String,
        system_id: String,
        system_type: String,
        manufacturer: String,
        model: String,
        installation_date: u64,
    },
    UpdateMaintenance {
        building_id: String,
        system_id: String,
    },
}

impl Command {
    /// Snake-case name, identical to the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterBuilding { .. } => "register_building",
            Command::VerifyBuilding { .. } => "verify_building",
            Command::TransferOwnership { .. } => "transfer_ownership",
            Command::RecordConsumption { .. } => "record_consumption",
            Command::ToggleOptimization { .. } => "toggle_optimization",
            Command::ScheduleTask { .. } => "schedule_task",
            Command::CompleteTask { .. } => "complete_task",
            Command::ReassignTask { .. } => "reassign_task",
            Command::RegisterSpace { .. } => "register_space",
            Command::UpdateOccupancy { .. } => "update_occupancy",
            Command::RegisterSystem { .. } => "register_system",
            Command::UpdateMaintenance { .. } => "update_maintenance",
        }
    }

    pub fn building_id(&self) -> &str {
        match self {
            Command::RegisterBuilding { building_id, .. }
            | Command::VerifyBuilding { building_id }
            | Command::TransferOwnership { building_id, .. }
            | Command::RecordConsumption { building_id, .. }
            | Command::ToggleOptimization { building_id, .. }
            | Command::ScheduleTask { building_id, .. }
            | Command::CompleteTask { building_id, .. }
            | Command::ReassignTask { building_id, .. }
            | Command::RegisterSpace { building_id, .. }
            | Command::UpdateOccupancy { building_id, .. }
            | Command::RegisterSystem { building_id, .. }
            | Command::UpdateMaintenance { building_id, .. } => building_id,
        }
    }
}

/// A command plus the ambient values it was issued under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub sequence: u64,
    pub height: u64,
    pub caller: Principal,
    pub command: Command,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl CommandEnvelope {
    pub fn new(sequence: u64, height: u64, caller: impl Into<Principal>, command: Command) -> Self {
        Self {
            sequence,
            height,
            caller: caller.into(),
            command,
            schema_version: SCHEMA_VERSION,
        }
    }
}
