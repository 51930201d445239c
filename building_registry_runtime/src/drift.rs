//! Drift detection: determinism verification and state comparison.
//!
//! All counts are i64 so deltas can go negative.

use std::collections::BTreeSet;
use std::fmt::Display;

use building_registry::collection::Collection;
use building_registry::{CommandEnvelope, Principal, RegistryConfig, RegistryState};

use crate::error::{Result, RuntimeError};
use crate::replay;

/// Replay the same commands twice and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism(config: &RegistryConfig, commands: &[CommandEnvelope]) -> Result<String> {
    let first = replay::rebuild_hash(config, commands)?;
    let second = replay::rebuild_hash(config, commands)?;
    if first != second {
        return Err(RuntimeError::Nondeterministic { first, second });
    }
    Ok(first)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountDelta {
    pub before: i64,
    pub after: i64,
    pub delta: i64,
}

impl CountDelta {
    fn new(before: usize, after: usize) -> Self {
        let (before, after) = (before as i64, after as i64);
        Self {
            before,
            after,
            delta: after - before,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChange {
    pub building_id: String,
    pub from: Principal,
    pub to: Principal,
}

/// Structured difference between two states.
///
/// Keys are rendered with their `Display` form (`b`, `b/i`, `b@h`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub buildings: CountDelta,
    pub energy_readings: CountDelta,
    pub maintenance_tasks: CountDelta,
    pub spaces: CountDelta,
    pub systems: CountDelta,
    pub added_buildings: Vec<String>,
    pub added_readings: Vec<String>,
    pub added_tasks: Vec<String>,
    pub added_spaces: Vec<String>,
    pub added_systems: Vec<String>,
    pub changed_buildings: Vec<String>,
    pub changed_readings: Vec<String>,
    pub changed_tasks: Vec<String>,
    pub changed_spaces: Vec<String>,
    pub changed_systems: Vec<String>,
    pub newly_verified: Vec<String>,
    pub newly_completed: Vec<String>,
    pub ownership_changes: Vec<OwnershipChange>,
}

impl DriftReport {
    /// True if nothing differs.
    pub fn is_empty(&self) -> bool {
        [
            self.buildings,
            self.energy_readings,
            self.maintenance_tasks,
            self.spaces,
            self.systems,
        ]
        .iter()
        .all(|c| c.delta == 0)
            && self.added_buildings.is_empty()
            && self.added_readings.is_empty()
            && self.added_tasks.is_empty()
            && self.added_spaces.is_empty()
            && self.added_systems.is_empty()
            && self.changed_buildings.is_empty()
            && self.changed_readings.is_empty()
            && self.changed_tasks.is_empty()
            && self.changed_spaces.is_empty()
            && self.changed_systems.is_empty()
            && self.newly_verified.is_empty()
            && self.newly_completed.is_empty()
            && self.ownership_changes.is_empty()
    }
}

/// Keys present in `b` but not in `a`, in key order.
fn added_keys<K: Ord + Display, V>(a: &Collection<K, V>, b: &Collection<K, V>) -> Vec<String> {
    let before: BTreeSet<&K> = a.keys().collect();
    b.keys()
        .filter(|k| !before.contains(k))
        .map(|k| k.to_string())
        .collect()
}

/// Keys present in both whose records differ, in key order.
fn changed_keys<K: Ord + Display, V: PartialEq>(a: &Collection<K, V>, b: &Collection<K, V>) -> Vec<String> {
    b.iter()
        .filter(|(key, after)| a.get(*key).map_or(false, |before| before != *after))
        .map(|(key, _)| key.to_string())
        .collect()
}

pub fn compare_states(a: &RegistryState, b: &RegistryState) -> DriftReport {
    let mut newly_verified = Vec::new();
    let mut ownership_changes = Vec::new();
    for (id, after) in &b.buildings {
        if let Some(before) = a.buildings.get(id) {
            if !before.verified && after.verified {
                newly_verified.push(id.clone());
            }
            if before.owner != after.owner {
                ownership_changes.push(OwnershipChange {
                    building_id: id.clone(),
                    from: before.owner.clone(),
                    to: after.owner.clone(),
                });
            }
        }
    }

    let newly_completed = b
        .maintenance_tasks
        .iter()
        .filter(|(key, after)| {
            after.completed
                && a.maintenance_tasks
                    .get(*key)
                    .map_or(false, |before| !before.completed)
        })
        .map(|(key, _)| key.to_string())
        .collect();

    DriftReport {
        buildings: CountDelta::new(a.buildings.len(), b.buildings.len()),
        energy_readings: CountDelta::new(a.energy_readings.len(), b.energy_readings.len()),
        maintenance_tasks: CountDelta::new(a.maintenance_tasks.len(), b.maintenance_tasks.len()),
        spaces: CountDelta::new(a.spaces.len(), b.spaces.len()),
        systems: CountDelta::new(a.systems.len(), b.systems.len()),
        added_buildings: added_keys(&a.buildings, &b.buildings),
        added_readings: added_keys(&a.energy_readings, &b.energy_readings),
        added_tasks: added_keys(&a.maintenance_tasks, &b.maintenance_tasks),
        added_spaces: added_keys(&a.spaces, &b.spaces),
        added_systems: added_keys(&a.systems, &b.systems),
        changed_buildings: changed_keys(&a.buildings, &b.buildings),
        changed_readings: changed_keys(&a.energy_readings, &b.energy_readings),
        changed_tasks: changed_keys(&a.maintenance_tasks, &b.maintenance_tasks),
        changed_spaces: changed_keys(&a.spaces, &b.spaces),
        changed_systems: changed_keys(&a.systems, &b.systems),
        newly_verified,
        newly_completed,
        ownership_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use building_registry::{Command, Registry};

    const ADMIN: &str = "ST1";

    fn commands() -> Vec<CommandEnvelope> {
        vec![
            CommandEnvelope::new(
                1,
                100,
                ADMIN,
                Command::RegisterBuilding {
                    building_id: "building1".into(),
                    address: "123 Main St".into(),
                    square_footage: 10000,
                },
            ),
            CommandEnvelope::new(
                2,
                110,
                ADMIN,
                Command::VerifyBuilding {
                    building_id: "building1".into(),
                },
            ),
            CommandEnvelope::new(
                3,
                120,
                ADMIN,
                Command::TransferOwnership {
                    building_id: "building1".into(),
                    new_owner: Principal::from("ST2"),
                },
            ),
            CommandEnvelope::new(
                4,
                130,
                ADMIN,
                Command::RecordConsumption {
                    building_id: "building1".into(),
                    electricity_kwh: 1000,
                    gas_therms: 50,
                    water_gallons: 2000,
                    temperature: 72,
                },
            ),
        ]
    }

    #[test]
    fn identical_states_have_no_drift() {
        let config = RegistryConfig::new(ADMIN);
        let (state, _) = replay::rebuild_state(&config, &commands()).unwrap();
        assert!(compare_states(&state, &state).is_empty());
    }

    #[test]
    fn report_tracks_lifecycle_changes() {
        let config = RegistryConfig::new(ADMIN);
        let all = commands();
        let mut reg = Registry::new(config);
        reg.apply_sequence(&all[..1]).unwrap();
        let before = reg.state().clone();
        reg.apply_sequence(&all[1..]).unwrap();

        let report = compare_states(&before, reg.state());
        assert_eq!(report.buildings, CountDelta { before: 1, after: 1, delta: 0 });
        assert_eq!(report.energy_readings.delta, 1);
        assert_eq!(report.added_readings, vec!["building1@130".to_string()]);
        assert_eq!(report.newly_verified, vec!["building1".to_string()]);
        assert_eq!(report.changed_buildings, vec!["building1".to_string()]);
        assert_eq!(
            report.ownership_changes,
            vec![OwnershipChange {
                building_id: "building1".into(),
                from: Principal::from(ADMIN),
                to: Principal::from("ST2"),
            }]
        );
        assert!(!report.is_empty());

        let reverse = compare_states(reg.state(), &before);
        assert_eq!(reverse.energy_readings.delta, -1);
        assert!(reverse.added_readings.is_empty());
    }

    #[test]
    fn field_only_changes_are_drift() {
        let config = RegistryConfig::new(ADMIN);
        let mut reg = Registry::new(config);
        reg.apply_sequence(&[
            CommandEnvelope::new(
                1,
                100,
                ADMIN,
                Command::RegisterSpace {
                    building_id: "building1".into(),
                    space_id: "space1".into(),
                    space_name: "Lobby".into(),
                    capacity: 20,
                },
            ),
        ])
        .unwrap();
        let before = reg.state().clone();
        reg.apply(&CommandEnvelope::new(
            2,
            110,
            ADMIN,
            Command::UpdateOccupancy {
                building_id: "building1".into(),
                space_id: "space1".into(),
                occupancy: 12,
            },
        ))
        .unwrap();

        let report = compare_states(&before, reg.state());
        assert_eq!(report.spaces.delta, 0);
        assert!(report.added_spaces.is_empty());
        assert_eq!(report.changed_spaces, vec!["building1/space1".to_string()]);
        assert!(!report.is_empty());
    }

    #[test]
    fn replay_is_deterministic() {
        let config = RegistryConfig::new(ADMIN);
        let hash = verify_determinism(&config, &commands()).unwrap();
        assert_eq!(hash, replay::rebuild_hash(&config, &commands()).unwrap());
    }
}
