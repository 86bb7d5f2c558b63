//! Garrison Sim - Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of a drone-garrison
//! strategy game with a rule-based AI opponent.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod resources;
pub mod systems;
pub mod world;

pub use api::{GarrisonKind, GarrisonSpec, SimWorld};
pub use components::*;
pub use config::SimConfig;
pub use error::{ConfigError, Result, SimError};
pub use resources::*;
pub use systems::*;
pub use world::Snapshot;
