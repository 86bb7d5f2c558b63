//! Global resources shared by several systems.

use crate::components::Faction;
use bevy_ecs::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Global simulation tick counter. Increments each fixed update.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Per-faction tally of live drones, parked and in flight.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    live_drones: [u32; 3],
}

impl GameState {
    pub fn live(&self, faction: Faction) -> u32 {
        self.live_drones[faction.index()]
    }

    pub fn add(&mut self, faction: Faction, count: u32) {
        let slot = &mut self.live_drones[faction.index()];
        *slot = slot.saturating_add(count);
    }

    pub fn lose(&mut self, faction: Faction, count: u32) {
        let slot = &mut self.live_drones[faction.index()];
        *slot = slot.saturating_sub(count);
    }
}

/// Deterministic random source for spawn scatter.
#[derive(Resource, Debug, Clone)]
pub struct SeededRng(pub ChaCha8Rng);

impl SeededRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::from_seed(0)
    }
}
