//! Production system - factories add drones to the garrison they sit on.

use crate::components::*;
use crate::resources::GameState;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// System that accumulates factory output and parks whole drones.
///
/// Neutral factories are idle until captured.
///
/// ## Data Access
/// - Reads: DeltaTime, Faction
/// - Writes: Factory, Garrison, GameState
pub fn production_system(
    dt: Res<DeltaTime>,
    mut game_state: ResMut<GameState>,
    mut query: Query<(&mut Factory, &mut Garrison, &Faction)>,
) {
    let delta = dt.0;
    for (mut factory, mut garrison, faction) in query.iter_mut() {
        if faction.is_neutral() || factory.drone_production_rate <= 0.0 {
            continue;
        }

        factory.progress += factory.drone_production_rate * delta;
        let produced = factory.progress.floor();
        if produced >= 1.0 {
            factory.progress -= produced;
            garrison.add_drones(produced as u32);
            game_state.add(*faction, produced as u32);
        }
    }
}
