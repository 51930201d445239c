/// Building Registry v1: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256.
///
/// Rules:
///   - `registry_version` first, then buildings, energy_readings,
///     maintenance_tasks, spaces, systems
///   - each collection is a list sorted by key (collection order)
///   - record fields in fixed order
///   - UTF-8 JSON, no whitespace, no float

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{
    Building, BuildingSystem, EnergyReading, MaintenanceTask, ReadingKey, RegistryState,
    ScopedKey, Space,
};
use crate::REGISTRY_VERSION;

/// Canonical serialization of the registry state to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &RegistryState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization, lowercase hex.
pub fn canonical_hash(state: &RegistryState) -> String {
    hex_digest(&canonical_serialize(state))
}

pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn build_canonical_value(state: &RegistryState) -> Value {
    let buildings = state
        .buildings
        .iter()
        .map(|(id, b)| building_value(id, b))
        .collect();
    let readings = state
        .energy_readings
        .iter()
        .map(|(k, r)| reading_value(k, r))
        .collect();
    let tasks = state
        .maintenance_tasks
        .iter()
        .map(|(k, t)| task_value(k, t))
        .collect();
    let spaces = state
        .spaces
        .iter()
        .map(|(k, s)| space_value(k, s))
        .collect();
    let systems = state
        .systems
        .iter()
        .map(|(k, s)| system_value(k, s))
        .collect();

    // registry_version MUST be first.
    let mut root = Map::new();
    root.insert("registry_version".into(), Value::from(REGISTRY_VERSION));
    root.insert("buildings".into(), Value::Array(buildings));
    root.insert("energy_readings".into(), Value::Array(readings));
    root.insert("maintenance_tasks".into(), Value::Array(tasks));
    root.insert("spaces".into(), Value::Array(spaces));
    root.insert("systems".into(), Value::Array(systems));
    Value::Object(root)
}

fn scoped(key: &ScopedKey) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("building_id".into(), Value::from(key.building_id.as_str()));
    m.insert("item_id".into(), Value::from(key.item_id.as_str()));
    m
}

fn building_value(id: &str, b: &Building) -> Value {
    let mut m = Map::new();
    m.insert("building_id".into(), Value::from(id));
    m.insert("owner".into(), Value::from(b.owner.as_str()));
    m.insert("address".into(), Value::from(b.address.as_str()));
    m.insert("square_footage".into(), Value::from(b.square_footage));
    m.insert("verified".into(), Value::Bool(b.verified));
    m.insert("verification_date".into(), Value::from(b.verification_date));
    Value::Object(m)
}

fn reading_value(key: &ReadingKey, r: &EnergyReading) -> Value {
    let mut m = Map::new();
    m.insert("building_id".into(), Value::from(key.building_id.as_str()));
    m.insert("height".into(), Value::from(key.height));
    m.insert("electricity_kwh".into(), Value::from(r.electricity_kwh));
    m.insert("gas_therms".into(), Value::from(r.gas_therms));
    m.insert("water_gallons".into(), Value::from(r.water_gallons));
    m.insert("temperature".into(), Value::from(r.temperature));
    m.insert("optimization_active".into(), Value::Bool(r.optimization_active));
    Value::Object(m)
}

fn task_value(key: &ScopedKey, t: &MaintenanceTask) -> Value {
    let mut m = scoped(key);
    m.insert("system_id".into(), Value::from(t.system_id.as_str()));
    m.insert("description".into(), Value::from(t.description.as_str()));
    m.insert("scheduled_date".into(), Value::from(t.scheduled_date));
    m.insert("completed".into(), Value::Bool(t.completed));
    m.insert("completion_date".into(), Value::from(t.completion_date));
    m.insert("assigned_to".into(), Value::from(t.assigned_to.as_str()));
    Value::Object(m)
}

fn space_value(key: &ScopedKey, s: &Space) -> Value {
    let mut m = scoped(key);
    m.insert("space_name".into(), Value::from(s.space_name.as_str()));
    m.insert("capacity".into(), Value::from(s.capacity));
    m.insert("current_occupancy".into(), Value::from(s.current_occupancy));
    m.insert("last_updated".into(), Value::from(s.last_updated));
    Value::Object(m)
}

fn system_value(key: &ScopedKey, s: &BuildingSystem) -> Value {
    let mut m = scoped(key);
    m.insert("system_type".into(), Value::from(s.system_type.as_str()));
    m.insert("manufacturer".into(), Value::from(s.manufacturer.as_str()));
    m.insert("model".into(), Value::from(s.model.as_str()));
    m.insert("installation_date".into(), Value::from(s.installation_date));
    m.insert("last_maintenance".into(), Value::from(s.last_maintenance));
    Value::Object(m)
}
