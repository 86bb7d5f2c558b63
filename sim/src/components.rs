//! ECS Components for the garrison simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position on the map.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Interpolated travel toward a fixed point.
/// `moving == false` means the entity has arrived.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Movement {
    pub target: Position,
    pub moving: bool,
}

impl Movement {
    pub fn toward(target: Position) -> Self {
        Self {
            target,
            moving: true,
        }
    }

    pub fn has_arrived(&self) -> bool {
        !self.moving
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable identifier for a garrison, independent of the ECS entity index.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GarrisonId(pub u32);

/// Owning side. Conquest flips this value.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Neutral,
    Player1,
    Player2,
}

impl Faction {
    pub fn is_neutral(&self) -> bool {
        matches!(self, Faction::Neutral)
    }

    /// The other player faction. Neutral has no opponent.
    pub fn opponent(&self) -> Option<Faction> {
        match self {
            Faction::Player1 => Some(Faction::Player2),
            Faction::Player2 => Some(Faction::Player1),
            Faction::Neutral => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Faction::Neutral => "Neutral",
            Faction::Player1 => "Player1",
            Faction::Player2 => "Player2",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Faction::Neutral => 0,
            Faction::Player1 => 1,
            Faction::Player2 => 2,
        }
    }
}

// ============================================================================
// GARRISON COMPONENTS
// ============================================================================

/// Stationary capturable node holding parked drones.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garrison {
    drone_count: u32,
}

impl Garrison {
    pub fn new(drone_count: u32) -> Self {
        Self { drone_count }
    }

    pub fn drone_count(&self) -> u32 {
        self.drone_count
    }

    pub fn set_drone_count(&mut self, count: u32) {
        self.drone_count = count;
    }

    pub fn add_drones(&mut self, count: u32) {
        self.drone_count = self.drone_count.saturating_add(count);
    }

    pub fn increment(&mut self) {
        self.add_drones(1);
    }

    /// Saturating: an empty garrison stays empty.
    pub fn decrement(&mut self) {
        self.drone_count = self.drone_count.saturating_sub(1);
    }
}

/// Depletable defense that must be knocked down before parked drones can be
/// harmed or the garrison captured.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub current: f32,
    pub max: f32,
    /// Shield points regenerated per second.
    pub regen_rate: f32,
}

impl Shield {
    /// Fully charged shield.
    pub fn new(max: f32, regen_rate: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            regen_rate: regen_rate.max(0.0),
        }
    }

    pub fn is_up(&self) -> bool {
        self.current > 0.0
    }

    /// One drone hit. Anything at or below `step` collapses to zero.
    pub fn hit(&mut self, step: f32) {
        if self.current > step {
            self.current -= step;
        } else {
            self.current = 0.0;
        }
    }

    pub fn regenerate(&mut self, dt: f32) {
        self.current = (self.current + self.regen_rate * dt).clamp(0.0, self.max);
    }
}

impl Default for Shield {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Marks a garrison as an economic target; produces drones while owned.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Factory {
    /// Drones per second.
    pub drone_production_rate: f32,
    /// Fractional drones accumulated toward the next whole drone.
    pub progress: f32,
}

impl Factory {
    pub fn new(drone_production_rate: f32) -> Self {
        Self {
            drone_production_rate,
            progress: 0.0,
        }
    }
}

/// Marks a garrison as an energy target.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerPlant {
    pub capacity: f32,
}

impl PowerPlant {
    pub fn new(capacity: f32) -> Self {
        Self { capacity }
    }
}

// ============================================================================
// UNIT / ORDER COMPONENTS
// ============================================================================

/// Marker for mobile offensive units.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Drone;

/// In-flight intent from one garrison to another.
///
/// On a garrison it is a pending spawn; on a drone it is a pending impact.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttackOrder {
    pub origin: Entity,
    pub target: Entity,
}

impl AttackOrder {
    pub fn new(origin: Entity, target: Entity) -> Self {
        Self { origin, target }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a garrison entity. Economic markers are inserted
/// separately.
#[derive(Bundle, Default)]
pub struct GarrisonBundle {
    pub id: GarrisonId,
    pub garrison: Garrison,
    pub faction: Faction,
    pub position: Position,
    pub shield: Shield,
}

/// Bundle for spawning a drone. A drone carries exactly one order and one
/// movement for its whole lifetime.
#[derive(Bundle)]
pub struct DroneBundle {
    pub drone: Drone,
    pub faction: Faction,
    pub position: Position,
    pub movement: Movement,
    pub order: AttackOrder,
}

impl DroneBundle {
    pub fn new(faction: Faction, position: Position, target_position: Position, order: AttackOrder) -> Self {
        Self {
            drone: Drone,
            faction,
            position,
            movement: Movement::toward(target_position),
            order,
        }
    }
}
