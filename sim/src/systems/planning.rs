//! Planning stage - strategy selection and attack-target selection.
//!
//! Consumes [`AiPerception`] and produces an ordered list of (source, target)
//! pairs in [`AiPlan`] for the execution stage.

use crate::components::*;
use crate::config::SimConfig;
use crate::systems::perception::{AiPerception, FactionTotals};
use bevy_ecs::prelude::*;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The AI's resource-allocation priority for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    None,
    Energy,
    Production,
    Defend,
    Attack,
    Distance,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::None => "None",
            Strategy::Energy => "Energy",
            Strategy::Production => "Production",
            Strategy::Defend => "Defend",
            Strategy::Attack => "Attack",
            Strategy::Distance => "Distance",
        }
    }

    /// Whether a target with the given economic markers serves this strategy.
    pub fn wants_target(&self, is_factory: bool, is_power_plant: bool) -> bool {
        match self {
            Strategy::Energy => is_power_plant,
            Strategy::Production => is_factory,
            Strategy::Distance => is_factory || is_power_plant,
            Strategy::None | Strategy::Defend | Strategy::Attack => false,
        }
    }
}

/// (source, target) pairs keyed by ascending distance.
pub type PairsByDistance = BTreeMap<OrderedFloat<f32>, (Entity, Entity)>;

/// Output of the planning stage. Singleton resource, replaced every tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct AiPlan {
    pub strategy: Strategy,
    pub feasible: PairsByDistance,
    pub infeasible: PairsByDistance,
    /// Orders for the execution stage, in priority order.
    pub final_targets: Vec<(Entity, Entity)>,
    /// Rally garrison when the consolidation fallback fired.
    pub consolidation_hub: Option<Entity>,
}

impl AiPlan {
    fn reset(&mut self) {
        self.feasible.clear();
        self.infeasible.clear();
        self.final_targets.clear();
        self.consolidation_hub = None;
    }
}

/// Positions of accepted attacks, for an external renderer.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugMarkers {
    pub attack_origins: Vec<Position>,
    pub attack_targets: Vec<Position>,
}

impl DebugMarkers {
    pub fn clear(&mut self) {
        self.attack_origins.clear();
        self.attack_targets.clear();
    }
}

/// Score every strategy. Exactly one scores 1.0.
pub fn strategy_priorities(ai: &FactionTotals, config: &SimConfig) -> [(Strategy, f32); 5] {
    let mut priorities = [
        (Strategy::Energy, 0.0),
        (Strategy::Production, 0.0),
        (Strategy::Defend, 0.0),
        (Strategy::Attack, 0.0),
        (Strategy::Distance, 0.0),
    ];

    let chosen = if ai.energy < config.energy_floor {
        Strategy::Energy
    } else {
        let ratio = ai.drones as f32 / ai.energy;
        if ratio < config.production_ratio_threshold {
            Strategy::Production
        } else if ratio > config.energy_ratio_threshold {
            Strategy::Energy
        } else {
            Strategy::Distance
        }
    };

    for (strategy, score) in priorities.iter_mut() {
        if *strategy == chosen {
            *score = 1.0;
        }
    }
    priorities
}

/// First strategy holding the maximum score.
pub fn select_strategy(priorities: &[(Strategy, f32)]) -> Strategy {
    let mut best = (Strategy::None, f32::MIN);
    for &(strategy, score) in priorities {
        if score > best.1 {
            best = (strategy, score);
        }
    }
    best.0
}

/// Drones needed to take a target `distance` away, including the shield it
/// regenerates while the wave is in flight.
pub fn attack_cost(target_drones: u32, shield: Option<&Shield>, distance: f32, config: &SimConfig) -> f32 {
    let (current, regen) = shield.map(|s| (s.current, s.regen_rate)).unwrap_or((0.0, 0.0));
    let travel_time = distance / config.drone_speed;
    target_drones as f32 + current + travel_time * regen + config.attack_safety_buffer
}

/// Planning system - turns the perception snapshot into an ordered target list.
///
/// ## Data Access
/// - Reads: SimConfig, Garrison, Position, Shield, Factory, PowerPlant
/// - Writes: AiPerception (outstanding orders), AiPlan, DebugMarkers
pub fn planning_system(
    config: Res<SimConfig>,
    perception: Option<ResMut<AiPerception>>,
    plan: Option<ResMut<AiPlan>>,
    mut debug: Option<ResMut<DebugMarkers>>,
    garrisons: Query<(&Garrison, &Position, Option<&Shield>, Has<Factory>, Has<PowerPlant>)>,
) {
    let (Some(mut perception), Some(mut plan)) = (perception, plan) else {
        tracing::error!("AI perception or plan resource missing; skipping planning");
        return;
    };
    let perception = &mut *perception;
    let plan = &mut *plan;
    if let Some(markers) = debug.as_mut() {
        markers.clear();
    }
    plan.reset();

    let strategy = select_strategy(&strategy_priorities(&perception.ai_totals, &config));
    if strategy != plan.strategy {
        tracing::info!(strategy = strategy.label(), "AI strategy changed");
    }
    plan.strategy = strategy;

    // Feasibility
    for (&source, candidates) in &perception.candidates_by_distance {
        let available = perception.garrison_drone_counts.get(&source).copied().unwrap_or(0);
        for (&distance, &target) in candidates {
            let Ok((garrison, _, shield, _, _)) = garrisons.get(target) else {
                continue;
            };
            if shield.is_none() {
                tracing::warn!(?target, "attack candidate has no shield; costing it as unshielded");
            }
            let cost = attack_cost(garrison.drone_count(), shield, distance.0, &config);
            if available as f32 > cost {
                plan.feasible.insert(distance, (source, target));
            } else {
                plan.infeasible.insert(distance, (source, target));
            }
        }
    }

    // Selection, closest first
    for (&distance, &(source, target)) in &plan.feasible {
        if perception.ai_orders.has_target(target)
            || perception.ai_orders.has_source(source)
            || distance.0 > config.max_attack_distance
        {
            continue;
        }
        let Ok((_, target_pos, _, is_factory, is_power_plant)) = garrisons.get(target) else {
            continue;
        };
        if !strategy.wants_target(is_factory, is_power_plant) {
            continue;
        }

        plan.final_targets.push((source, target));
        perception.ai_orders.insert(source, target);

        if let Some(markers) = debug.as_mut() {
            if let Ok((_, origin_pos, _, _, _)) = garrisons.get(source) {
                markers.attack_origins.push(*origin_pos);
            }
            markers.attack_targets.push(*target_pos);
        }
    }

    if plan.final_targets.is_empty() {
        consolidate(perception, plan);
    }

    tracing::debug!(
        strategy = strategy.label(),
        feasible = plan.feasible.len(),
        infeasible = plan.infeasible.len(),
        orders = plan.final_targets.len(),
        "plan complete"
    );
}

/// Fallback: pull every AI garrison's drones toward the source of the
/// closest infeasible attack.
fn consolidate(perception: &AiPerception, plan: &mut AiPlan) {
    let Some((_, &(hub, _))) = plan.infeasible.first_key_value() else {
        tracing::debug!("no attack candidates; nothing to consolidate");
        return;
    };

    plan.consolidation_hub = Some(hub);
    for &garrison in &perception.ai_garrisons {
        if garrison != hub {
            plan.final_targets.push((garrison, hub));
        }
    }
    tracing::debug!(?hub, transfers = plan.final_targets.len(), "no attack accepted; consolidating");
}
