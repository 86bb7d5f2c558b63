//! Execution stage - materializes the plan as [`AttackOrder`] components.
//!
//! This is the only channel through which planning intent reaches combat.

use crate::components::*;
use crate::config::SimConfig;
use crate::systems::planning::AiPlan;
use bevy_ecs::prelude::*;

/// System that attaches planned orders to their source garrisons, at most
/// `max_orders_per_tick` per tick. Extra plan entries are dropped silently;
/// the next planning pass will propose them again if still relevant.
pub fn execution_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    plan: Option<Res<AiPlan>>,
    pending: Query<(), With<AttackOrder>>,
) {
    let Some(plan) = plan else {
        tracing::error!("AiPlan resource missing; skipping execution");
        return;
    };

    let mut issued = 0;
    for &(source, target) in &plan.final_targets {
        if issued >= config.max_orders_per_tick {
            break;
        }
        // A garrison still waiting to spawn keeps its current order
        if pending.contains(source) {
            continue;
        }
        let Some(mut entity) = commands.get_entity(source) else {
            tracing::warn!(?source, "planned source no longer exists");
            continue;
        };
        entity.insert(AttackOrder::new(source, target));
        issued += 1;
    }
}
