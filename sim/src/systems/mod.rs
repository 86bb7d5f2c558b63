//! ECS Systems for the garrison simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick Stages
//!
//! Every fixed tick runs the stages strictly in this order:
//!
//! **Environment** - world upkeep, independent of each other:
//! - `production_system` - factories add drones
//! - `shield_regen_system` - shields recharge
//!
//! **Perception** - `perception_system` rebuilds the AI's view of the world
//!
//! **Planning** - `planning_system` picks a strategy and attack targets
//!
//! **Execution** - `execution_system` attaches orders, rate-limited per tick
//!
//! **Combat Resolution** - for both factions, chained:
//! - `order_spawn_system` - garrison orders become drone waves
//! - `drone_movement_system` - drones travel
//! - `drone_impact_system` - arrived drones hit, park or conquer

pub mod combat;
pub mod execution;
pub mod movement;
pub mod perception;
pub mod planning;
pub mod production;
pub mod serialization;
pub mod shield;

pub use combat::*;
pub use execution::*;
pub use movement::*;
pub use perception::*;
pub use planning::*;
pub use production::*;
pub use serialization::*;
pub use shield::*;

use bevy_ecs::prelude::*;

/// Ordered stages of one simulation tick.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickStage {
    Environment,
    Perception,
    Planning,
    Execution,
    CombatResolution,
}

/// Build the per-tick schedule with every stage chained in order.
pub fn build_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.configure_sets(
        (
            TickStage::Environment,
            TickStage::Perception,
            TickStage::Planning,
            TickStage::Execution,
            TickStage::CombatResolution,
        )
            .chain(),
    );

    schedule.add_systems((production_system, shield_regen_system).in_set(TickStage::Environment));
    schedule.add_systems(perception_system.in_set(TickStage::Perception));
    schedule.add_systems(planning_system.in_set(TickStage::Planning));
    schedule.add_systems(execution_system.in_set(TickStage::Execution));
    schedule.add_systems(
        (order_spawn_system, drone_movement_system, drone_impact_system)
            .chain()
            .in_set(TickStage::CombatResolution),
    );
    schedule
}
