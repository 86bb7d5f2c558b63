//! Shield system - regenerates garrison shields over time.

use crate::components::*;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// System that recharges every shield toward its maximum.
pub fn shield_regen_system(dt: Res<DeltaTime>, mut query: Query<&mut Shield>) {
    let delta = dt.0;
    for mut shield in query.iter_mut() {
        shield.regenerate(delta);
    }
}
