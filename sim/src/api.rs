//! Public API for the simulation.
//!
//! This module provides the main interface for a renderer, an input layer or
//! a test harness to drive the simulation.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 30 Hz). When `step(dt)` is called,
//! the simulation accumulates time and runs fixed updates as needed. This ensures deterministic
//! behavior regardless of frame rate.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::resources::{GameState, SeededRng, SimTick};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// Economic role of a garrison.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GarrisonKind {
    #[default]
    Outpost,
    Factory { drone_production_rate: f32 },
    PowerPlant { capacity: f32 },
}

/// Everything needed to place a garrison on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarrisonSpec {
    pub faction: Faction,
    pub x: f32,
    pub y: f32,
    pub drones: u32,
    pub shield_max: f32,
    pub shield_regen: f32,
    pub kind: GarrisonKind,
}

impl GarrisonSpec {
    pub fn outpost(faction: Faction, x: f32, y: f32, drones: u32) -> Self {
        Self {
            faction,
            x,
            y,
            drones,
            shield_max: 0.0,
            shield_regen: 0.0,
            kind: GarrisonKind::Outpost,
        }
    }

    pub fn with_shield(mut self, max: f32, regen: f32) -> Self {
        self.shield_max = max;
        self.shield_regen = regen;
        self
    }

    pub fn factory(mut self, drone_production_rate: f32) -> Self {
        self.kind = GarrisonKind::Factory { drone_production_rate };
        self
    }

    pub fn power_plant(mut self, capacity: f32) -> Self {
        self.kind = GarrisonKind::PowerPlant { capacity };
        self
    }
}

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Building a map of garrisons
/// - Stepping the simulation forward
/// - Extracting state snapshots
/// - Issuing orders on behalf of the non-AI player
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
    next_garrison_id: u32,
}

impl SimWorld {
    /// Create a new empty simulation world.
    pub fn new() -> Self {
        Self::build(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimConfig) -> Self {
        let mut world = World::new();

        // Core resources
        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SimTick(0));
        world.insert_resource(SeededRng::from_seed(config.rng_seed));
        world.insert_resource(GameState::default());

        // AI context, one per match
        world.insert_resource(AiPerception::default());
        world.insert_resource(AiPlan::default());
        world.insert_resource(DebugMarkers::default());

        world.insert_resource(config);

        Self {
            world,
            schedule: build_tick_schedule(),
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
            next_garrison_id: 0,
        }
    }

    /// Create a small symmetric skirmish map for demonstration.
    ///
    /// Player1 holds the west, the AI (Player2) the east; neutral economic
    /// garrisons sit in between.
    pub fn new_skirmish() -> Self {
        let mut sim = Self::new();

        // Home bases
        sim.spawn_garrison(GarrisonSpec::outpost(Faction::Player1, -400.0, 0.0, 30).with_shield(10.0, 0.5).factory(0.5));
        sim.spawn_garrison(GarrisonSpec::outpost(Faction::Player2, 400.0, 0.0, 30).with_shield(10.0, 0.5).factory(0.5));
        sim.spawn_garrison(GarrisonSpec::outpost(Faction::Player1, -300.0, 150.0, 8).with_shield(4.0, 0.2));
        sim.spawn_garrison(GarrisonSpec::outpost(Faction::Player2, 300.0, -150.0, 8).with_shield(4.0, 0.2));

        // Neutral economy in the middle
        for (i, &(x, y)) in [(-150.0, -100.0), (150.0, 100.0), (0.0, 0.0)].iter().enumerate() {
            let spec = GarrisonSpec::outpost(Faction::Neutral, x, y, 3).with_shield(3.0, 0.1);
            if i == 2 {
                sim.spawn_garrison(spec.factory(0.3));
            } else {
                sim.spawn_garrison(spec.power_plant(15.0));
            }
        }
        sim.spawn_garrison(GarrisonSpec::outpost(Faction::Neutral, 0.0, 250.0, 5).with_shield(5.0, 0.1).power_plant(25.0));
        sim.spawn_garrison(GarrisonSpec::outpost(Faction::Neutral, 0.0, -250.0, 5).with_shield(5.0, 0.1).factory(0.6));

        sim
    }

    /// Place a garrison. Its starting drones count toward the owner's live tally.
    pub fn spawn_garrison(&mut self, spec: GarrisonSpec) -> Entity {
        let id = GarrisonId(self.next_garrison_id);
        self.next_garrison_id += 1;

        let mut entity = self.world.spawn(GarrisonBundle {
            id,
            garrison: Garrison::new(spec.drones),
            faction: spec.faction,
            position: Position::new(spec.x, spec.y),
            shield: Shield::new(spec.shield_max, spec.shield_regen),
        });
        match spec.kind {
            GarrisonKind::Outpost => {}
            GarrisonKind::Factory { drone_production_rate } => {
                entity.insert(Factory::new(drone_production_rate));
            }
            GarrisonKind::PowerPlant { capacity } => {
                entity.insert(PowerPlant::new(capacity));
            }
        }
        let entity = entity.id();

        self.world.resource_mut::<GameState>().add(spec.faction, spec.drones);
        entity
    }

    /// Find the entity of a garrison by its stable id.
    pub fn garrison_entity(&mut self, id: u32) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &GarrisonId)>();
        query.iter(&self.world).find(|(_, gid)| gid.0 == id).map(|(e, _)| e)
    }

    /// Issue an attack (or transfer) order from one garrison to another.
    ///
    /// This is how the non-AI player acts; the order resolves exactly like an
    /// AI order on the next tick.
    pub fn order_attack(&mut self, source: u32, target: u32) -> Result<()> {
        if source == target {
            return Err(SimError::SelfTarget(source));
        }
        let source_entity = self.garrison_entity(source).ok_or(SimError::UnknownGarrison(source))?;
        let target_entity = self.garrison_entity(target).ok_or(SimError::UnknownGarrison(target))?;
        self.world
            .entity_mut(source_entity)
            .insert(AttackOrder::new(source_entity, target_entity));
        Ok(())
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs fixed updates
    /// as needed. This ensures deterministic behavior regardless of frame rate.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.config().fixed_timestep;

        // Accumulate time
        self.time_accumulator += dt;

        // Run fixed updates
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run exactly one fixed tick, ignoring the accumulator.
    pub fn tick_once(&mut self) {
        let fixed_dt = self.config().fixed_timestep;
        self.fixed_update(fixed_dt);
    }

    /// Run a single fixed timestep update.
    fn fixed_update(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SimTick>().increment();

        // Run all stages
        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn game_state(&self) -> &GameState {
        self.world.resource::<GameState>()
    }

    /// The AI's view from the last tick.
    pub fn perception(&self) -> Option<&AiPerception> {
        self.world.get_resource::<AiPerception>()
    }

    /// The AI's plan from the last tick.
    pub fn plan(&self) -> Option<&AiPlan> {
        self.world.get_resource::<AiPlan>()
    }

    /// Attack markers from the last tick (for debugging/visualization).
    pub fn debug_markers(&self) -> Option<&DebugMarkers> {
        self.world.get_resource::<DebugMarkers>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
