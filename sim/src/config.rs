//! Simulation tuning values.
//!
//! Every constant the AI and combat stages depend on lives here so that it can
//! be supplied from a JSON file instead of being baked into the systems.

use crate::components::Faction;
use crate::error::ConfigError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the simulation core.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds (e.g., 1/30 = 0.0333 for 30 Hz).
    pub fixed_timestep: f32,
    /// Drone travel speed in world units per second.
    pub drone_speed: f32,
    /// Distance at which a drone counts as arrived.
    pub arrival_radius: f32,
    /// Candidates farther than this are never attacked.
    pub max_attack_distance: f32,
    /// Extra drones added on top of the estimated attack cost.
    pub attack_safety_buffer: f32,
    /// Below this AI energy total the AI always goes for energy.
    pub energy_floor: f32,
    /// Drone/energy ratio below which the AI prioritises production.
    pub production_ratio_threshold: f32,
    /// Drone/energy ratio above which the AI prioritises energy.
    pub energy_ratio_threshold: f32,
    /// Backpressure cap on new orders per tick.
    pub max_orders_per_tick: usize,
    /// Shield points removed by one drone impact.
    pub shield_decrement_step: f32,
    pub spawn_spread_base: f32,
    pub spawn_spread_per_drone: f32,
    pub spawn_spread_max: f32,
    /// Faction driven by the rule-based AI.
    pub ai_faction: Faction,
    /// Seed for spawn offsets.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 30.0, // 30 Hz
            drone_speed: 120.0,
            arrival_radius: 2.0,
            max_attack_distance: 600.0,
            attack_safety_buffer: 2.0,
            energy_floor: 20.0,
            production_ratio_threshold: 0.5,
            energy_ratio_threshold: 0.9,
            max_orders_per_tick: 2,
            shield_decrement_step: 1.0,
            spawn_spread_base: 25.0,
            spawn_spread_per_drone: 5.0,
            spawn_spread_max: 75.0,
            ai_faction: Faction::Player2,
            rng_seed: 0x5EED_0F_D201,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("fixed_timestep", self.fixed_timestep),
            ("drone_speed", self.drone_speed),
            ("max_attack_distance", self.max_attack_distance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("arrival_radius", self.arrival_radius),
            ("attack_safety_buffer", self.attack_safety_buffer),
            ("energy_floor", self.energy_floor),
            ("shield_decrement_step", self.shield_decrement_step),
            ("spawn_spread_base", self.spawn_spread_base),
            ("spawn_spread_per_drone", self.spawn_spread_per_drone),
            ("spawn_spread_max", self.spawn_spread_max),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }

        if self.production_ratio_threshold > self.energy_ratio_threshold {
            return Err(ConfigError::Invalid(format!(
                "production_ratio_threshold ({}) exceeds energy_ratio_threshold ({})",
                self.production_ratio_threshold, self.energy_ratio_threshold
            )));
        }
        if self.max_orders_per_tick == 0 {
            return Err(ConfigError::Invalid("max_orders_per_tick must be at least 1".to_string()));
        }
        if self.ai_faction.is_neutral() {
            return Err(ConfigError::Invalid("ai_faction cannot be Neutral".to_string()));
        }
        Ok(())
    }

    /// Scatter radius for a spawn wave of `wave_size` drones.
    pub fn spawn_spread(&self, wave_size: u32) -> f32 {
        (self.spawn_spread_base + self.spawn_spread_per_drone * wave_size as f32).min(self.spawn_spread_max)
    }
}
