//! Snapshot types for renderers and other observers.
//!
//! The `Snapshot` struct provides a serializable, read-only view of the
//! simulation state. Nothing in it feeds back into the core.

use crate::components::*;
use crate::resources::GameState;
use crate::systems::planning::{AiPlan, DebugMarkers};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single garrison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarrisonSnapshot {
    pub id: u32,
    pub faction: String,
    pub x: f32,
    pub y: f32,
    pub drones: u32,
    pub shield: f32,
    pub shield_max: f32,
    pub kind: String,
}

/// Snapshot of a drone in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneSnapshot {
    pub faction: String,
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
}

/// Live drone tallies per player faction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LiveDroneSnapshot {
    pub player1: u32,
    pub player2: u32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// AI strategy chosen on the last tick.
    pub strategy: String,
    pub garrisons: Vec<GarrisonSnapshot>,
    pub drones: Vec<DroneSnapshot>,
    pub live_drones: LiveDroneSnapshot,
    /// Debug markers: origins of attacks accepted on the last tick.
    pub attack_origins: Vec<(f32, f32)>,
    /// Debug markers: targets of attacks accepted on the last tick.
    pub attack_targets: Vec<(f32, f32)>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut garrisons = Vec::new();
        let mut query = world.query::<(
            &GarrisonId,
            &Garrison,
            &Faction,
            &Position,
            Option<&Shield>,
            Has<Factory>,
            Has<PowerPlant>,
        )>();
        for (id, garrison, faction, pos, shield, is_factory, is_power_plant) in query.iter(world) {
            let kind = if is_factory {
                "Factory"
            } else if is_power_plant {
                "PowerPlant"
            } else {
                "Outpost"
            };
            garrisons.push(GarrisonSnapshot {
                id: id.0,
                faction: faction.label().to_string(),
                x: pos.x,
                y: pos.y,
                drones: garrison.drone_count(),
                shield: shield.map(|s| s.current).unwrap_or(0.0),
                shield_max: shield.map(|s| s.max).unwrap_or(0.0),
                kind: kind.to_string(),
            });
        }
        garrisons.sort_by_key(|g| g.id);

        let mut drones = Vec::new();
        let mut drone_query = world.query_filtered::<(&Faction, &Position, &Movement), With<Drone>>();
        for (faction, pos, movement) in drone_query.iter(world) {
            drones.push(DroneSnapshot {
                faction: faction.label().to_string(),
                x: pos.x,
                y: pos.y,
                target_x: movement.target.x,
                target_y: movement.target.y,
            });
        }

        let live_drones = world
            .get_resource::<GameState>()
            .map(|state| LiveDroneSnapshot {
                player1: state.live(Faction::Player1),
                player2: state.live(Faction::Player2),
            })
            .unwrap_or_default();

        let strategy = world
            .get_resource::<AiPlan>()
            .map(|plan| plan.strategy.label())
            .unwrap_or("None")
            .to_string();

        let (attack_origins, attack_targets): (Vec<(f32, f32)>, Vec<(f32, f32)>) = world
            .get_resource::<DebugMarkers>()
            .map(|markers| {
                (
                    markers.attack_origins.iter().map(|p| (p.x, p.y)).collect(),
                    markers.attack_targets.iter().map(|p| (p.x, p.y)).collect(),
                )
            })
            .unwrap_or_default();

        Self {
            tick,
            time,
            strategy,
            garrisons,
            drones,
            live_drones,
            attack_origins,
            attack_targets,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
