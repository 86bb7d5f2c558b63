//! Perception stage - aggregates the world into the AI's view for this tick.
//!
//! The snapshot is rebuilt from scratch every tick. Nothing is carried over:
//! garrison ownership and drone counts change constantly, so stale entries
//! would point the planner at targets that no longer exist.
//!
//! ## Parallel Feature
//!
//! When compiled with `--features parallel`, the per-garrison candidate
//! distance maps are built with rayon.

use crate::components::*;
use crate::config::SimConfig;
use bevy_ecs::prelude::*;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Distance-sorted attack candidates for one source garrison.
pub type CandidateMap = BTreeMap<OrderedFloat<f32>, Entity>;

/// An order known to be outstanding, as seen by perception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InFlightOrder {
    pub origin: Entity,
    pub target: Entity,
    /// Reserved for cost annotation; always zero for now.
    pub cost: f32,
    /// Reserved for priority annotation; always zero for now.
    pub priority: f32,
}

/// Set of outstanding orders for one faction, unique per (origin, target).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InFlightOrders {
    orders: Vec<InFlightOrder>,
}

impl InFlightOrders {
    pub fn insert(&mut self, origin: Entity, target: Entity) {
        if !self.contains(origin, target) {
            self.orders.push(InFlightOrder {
                origin,
                target,
                cost: 0.0,
                priority: 0.0,
            });
        }
    }

    pub fn contains(&self, origin: Entity, target: Entity) -> bool {
        self.orders.iter().any(|o| o.origin == origin && o.target == target)
    }

    pub fn has_source(&self, origin: Entity) -> bool {
        self.orders.iter().any(|o| o.origin == origin)
    }

    pub fn has_target(&self, target: Entity) -> bool {
        self.orders.iter().any(|o| o.target == target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InFlightOrder> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }
}

/// Strength and economy totals for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactionTotals {
    /// Parked plus in-flight drones.
    pub drones: u32,
    pub energy: f32,
    pub production: f32,
}

/// The AI's aggregated view of the world. Singleton resource.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct AiPerception {
    /// Drone count of every non-neutral garrison holding drones.
    pub garrison_drone_counts: BTreeMap<Entity, u32>,
    pub ai_totals: FactionTotals,
    pub opponent_totals: FactionTotals,
    pub ai_garrisons: BTreeSet<Entity>,
    pub opponent_garrisons: BTreeSet<Entity>,
    /// source -> distance -> target, for every AI garrison.
    pub candidates_by_distance: BTreeMap<Entity, CandidateMap>,
    pub ai_orders: InFlightOrders,
    pub opponent_orders: InFlightOrders,
}

impl AiPerception {
    /// Clear every accumulator before a fresh pass.
    pub fn reset(&mut self) {
        self.garrison_drone_counts.clear();
        self.ai_totals = FactionTotals::default();
        self.opponent_totals = FactionTotals::default();
        self.ai_garrisons.clear();
        self.opponent_garrisons.clear();
        self.candidates_by_distance.clear();
        self.ai_orders.clear();
        self.opponent_orders.clear();
    }

    fn totals_mut(&mut self, faction: Faction, ai_faction: Faction) -> Option<&mut FactionTotals> {
        if faction == ai_faction {
            Some(&mut self.ai_totals)
        } else if Some(faction) == ai_faction.opponent() {
            Some(&mut self.opponent_totals)
        } else {
            None
        }
    }

    fn orders_mut(&mut self, faction: Faction, ai_faction: Faction) -> Option<&mut InFlightOrders> {
        if faction == ai_faction {
            Some(&mut self.ai_orders)
        } else if Some(faction) == ai_faction.opponent() {
            Some(&mut self.opponent_orders)
        } else {
            None
        }
    }
}

/// Perception system - rebuilds [`AiPerception`] from the world.
///
/// ## Data Access
/// - Reads: SimConfig, Garrison, Faction, Position, Drone, Factory, PowerPlant, AttackOrder
/// - Writes: AiPerception
pub fn perception_system(
    config: Res<SimConfig>,
    perception: Option<ResMut<AiPerception>>,
    garrisons: Query<(Entity, &Garrison, Option<&Faction>, &Position)>,
    drones: Query<&Faction, With<Drone>>,
    factories: Query<(&Factory, &Faction)>,
    power_plants: Query<(&PowerPlant, &Faction)>,
    orders: Query<(&AttackOrder, &Faction)>,
) {
    let Some(mut perception) = perception else {
        tracing::error!("AiPerception resource missing; skipping perception");
        return;
    };
    let ai_faction = config.ai_faction;
    perception.reset();

    // Garrison strength
    for (entity, garrison, faction, _) in garrisons.iter() {
        let Some(&faction) = faction else { continue };
        let count = garrison.drone_count();
        if count == 0 || faction.is_neutral() {
            continue;
        }
        perception.garrison_drone_counts.insert(entity, count);
        if let Some(totals) = perception.totals_mut(faction, ai_faction) {
            totals.drones += count;
        }
        if faction == ai_faction {
            perception.ai_garrisons.insert(entity);
        } else if Some(faction) == ai_faction.opponent() {
            perception.opponent_garrisons.insert(entity);
        }
    }

    // In-flight drones still count toward strength
    for faction in drones.iter() {
        if let Some(totals) = perception.totals_mut(*faction, ai_faction) {
            totals.drones += 1;
        }
    }

    for (factory, faction) in factories.iter() {
        if factory.drone_production_rate > 0.0 {
            if let Some(totals) = perception.totals_mut(*faction, ai_faction) {
                totals.production += factory.drone_production_rate;
            }
        }
    }

    for (plant, faction) in power_plants.iter() {
        if plant.capacity > 0.0 {
            if let Some(totals) = perception.totals_mut(*faction, ai_faction) {
                totals.energy += plant.capacity;
            }
        }
    }

    // Anything the AI does not own is a candidate target
    let targets: Vec<(Entity, Position)> = garrisons
        .iter()
        .filter(|(_, _, faction, _)| faction.copied() != Some(ai_faction))
        .map(|(entity, _, _, pos)| (entity, *pos))
        .collect();

    let sources: Vec<(Entity, Position)> = perception
        .ai_garrisons
        .iter()
        .filter_map(|&entity| garrisons.get(entity).ok().map(|(_, _, _, pos)| (entity, *pos)))
        .collect();

    #[cfg(feature = "parallel")]
    let candidate_maps: Vec<(Entity, CandidateMap)> = sources
        .par_iter()
        .map(|&(source, pos)| (source, candidate_distances(source, pos, &targets)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let candidate_maps: Vec<(Entity, CandidateMap)> = sources
        .iter()
        .map(|&(source, pos)| (source, candidate_distances(source, pos, &targets)))
        .collect();

    perception.candidates_by_distance.extend(candidate_maps);

    for (order, faction) in orders.iter() {
        if let Some(set) = perception.orders_mut(*faction, ai_faction) {
            set.insert(order.origin, order.target);
        }
    }
}

/// Distances from one source to every candidate target.
///
/// Targets at identical distance overwrite each other; the last one wins.
pub fn candidate_distances(source: Entity, source_pos: Position, targets: &[(Entity, Position)]) -> CandidateMap {
    let mut map = CandidateMap::new();
    for &(target, target_pos) in targets {
        if target == source {
            continue;
        }
        map.insert(OrderedFloat(source_pos.distance_to(&target_pos)), target);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_garrison(world: &mut World, faction: Faction, x: f32, drones: u32) -> Entity {
        world
            .spawn(GarrisonBundle {
                garrison: Garrison::new(drones),
                faction,
                position: Position::new(x, 0.0),
                ..Default::default()
            })
            .id()
    }

    fn run_perception(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(perception_system);
        schedule.run(world);
    }

    fn test_world() -> (World, Entity, Entity, Entity) {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        world.insert_resource(AiPerception::default());

        let ai = spawn_garrison(&mut world, Faction::Player2, 0.0, 10);
        let enemy = spawn_garrison(&mut world, Faction::Player1, 100.0, 4);
        let neutral = spawn_garrison(&mut world, Faction::Neutral, 50.0, 3);
        world.entity_mut(ai).insert(PowerPlant::new(25.0));
        world.entity_mut(enemy).insert(Factory::new(0.5));
        (world, ai, enemy, neutral)
    }

    #[test]
    fn test_perception_aggregates_totals() {
        let (mut world, ai, enemy, neutral) = test_world();
        world.spawn(DroneBundle::new(
            Faction::Player2,
            Position::default(),
            Position::new(100.0, 0.0),
            AttackOrder::new(ai, enemy),
        ));

        run_perception(&mut world);

        let perception = world.resource::<AiPerception>();
        assert_eq!(perception.ai_totals.drones, 11);
        assert_eq!(perception.ai_totals.energy, 25.0);
        assert_eq!(perception.opponent_totals.drones, 4);
        assert_eq!(perception.opponent_totals.production, 0.5);
        assert!(perception.ai_garrisons.contains(&ai));
        assert!(perception.opponent_garrisons.contains(&enemy));
        assert!(!perception.garrison_drone_counts.contains_key(&neutral));
        assert!(perception.ai_orders.contains(ai, enemy));
        assert!(perception.opponent_orders.is_empty());
    }

    #[test]
    fn test_candidates_sorted_by_distance_and_exclude_own() {
        let (mut world, ai, enemy, neutral) = test_world();
        let other_ai = spawn_garrison(&mut world, Faction::Player2, 20.0, 2);

        run_perception(&mut world);

        let perception = world.resource::<AiPerception>();
        let candidates = &perception.candidates_by_distance[&ai];
        let ordered: Vec<Entity> = candidates.values().copied().collect();
        assert_eq!(ordered, vec![neutral, enemy]);
        assert!(!ordered.contains(&other_ai));
        assert_eq!(perception.candidates_by_distance.len(), 2);
    }

    #[test]
    fn test_perception_is_idempotent() {
        let (mut world, _, _, _) = test_world();

        run_perception(&mut world);
        let first = world.resource::<AiPerception>().clone();
        run_perception(&mut world);
        let second = world.resource::<AiPerception>().clone();

        assert_eq!(first, second);
    }

    #[test]
    fn test_stale_entries_are_dropped() {
        let (mut world, ai, enemy, _) = test_world();
        run_perception(&mut world);

        // Enemy garrison falls to the AI between ticks
        *world.get_mut::<Faction>(enemy).unwrap() = Faction::Player2;
        run_perception(&mut world);

        let perception = world.resource::<AiPerception>();
        assert!(perception.opponent_garrisons.is_empty());
        assert!(!perception.candidates_by_distance[&ai].values().any(|&t| t == enemy));
    }

    #[test]
    fn test_missing_perception_resource_is_noop() {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        spawn_garrison(&mut world, Faction::Player2, 0.0, 5);

        run_perception(&mut world);

        assert!(world.get_resource::<AiPerception>().is_none());
    }
}
