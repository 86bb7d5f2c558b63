//! Combat resolution - turns attack orders into drone waves and impacts.
//!
//! Each order moves through three states:
//!
//! 1. **Issued** - `AttackOrder` on a garrison. The spawn system launches a
//!    wave of `drone_count - 1` drones and strips the order.
//! 2. **Spawned** - `AttackOrder` + `Movement` on each drone, travelling.
//! 3. **Resolved** - the drone arrived; the impact system applies the hit to
//!    the target and despawns the drone.
//!
//! Runs for every faction, not just the AI. Structural changes go through
//! `Commands`, so nothing is spawned or despawned while a query is iterating.

use crate::components::*;
use crate::config::SimConfig;
use crate::resources::{GameState, SeededRng};
use bevy_ecs::prelude::*;
use rand::Rng;

/// Smallest garrison that can launch a wave; one drone always stays home.
const MIN_LAUNCH_DRONES: u32 = 2;

/// What a single drone impact did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactOutcome {
    /// Friendly target; the drone joined the garrison.
    Parked,
    /// Shield still up after the hit.
    Absorbed,
    /// Shield down; one defender traded for the attacker.
    Attrition { defender: Faction },
    /// Shield down and garrison empty; ownership flipped.
    Conquest { previous: Faction },
}

/// Apply one arriving drone of faction `attacker` to a target garrison.
///
/// A target without a shield is treated as already unshielded.
pub fn resolve_impact(
    attacker: Faction,
    garrison: &mut Garrison,
    owner: &mut Faction,
    shield: Option<&mut Shield>,
    shield_step: f32,
) -> ImpactOutcome {
    if *owner == attacker {
        garrison.increment();
        return ImpactOutcome::Parked;
    }

    let remaining = match shield {
        Some(shield) => {
            shield.hit(shield_step);
            shield.current
        }
        None => 0.0,
    };

    if remaining > 0.0 {
        ImpactOutcome::Absorbed
    } else if garrison.drone_count() > 0 {
        garrison.decrement();
        ImpactOutcome::Attrition { defender: *owner }
    } else {
        let previous = *owner;
        *owner = attacker;
        garrison.increment();
        ImpactOutcome::Conquest { previous }
    }
}

/// Issued -> Spawned.
///
/// ## Data Access
/// - Reads: SimConfig, AttackOrder, Faction, Position
/// - Writes: Garrison, SeededRng; spawns drones and removes orders via Commands
pub fn order_spawn_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    mut rng: ResMut<SeededRng>,
    mut garrisons: Query<(Entity, &mut Garrison, &AttackOrder), Without<Drone>>,
    factions: Query<&Faction>,
    positions: Query<&Position>,
) {
    for (entity, mut garrison, order) in garrisons.iter_mut() {
        commands.entity(entity).remove::<AttackOrder>();

        if garrison.drone_count() < MIN_LAUNCH_DRONES {
            continue;
        }

        let Ok(&faction) = factions.get(order.origin) else {
            tracing::error!(origin = ?order.origin, "attack order origin has no faction; dropping order");
            continue;
        };
        let (Ok(&origin_pos), Ok(&target_pos)) = (positions.get(order.origin), positions.get(order.target)) else {
            tracing::warn!(?order, "attack order references a missing entity; dropping order");
            continue;
        };

        let wave_size = garrison.drone_count() - 1;
        let spread = config.spawn_spread(wave_size);

        for _ in 0..wave_size {
            let offset = if spread > 0.0 {
                (rng.0.gen_range(-spread..spread), rng.0.gen_range(-spread..spread))
            } else {
                (0.0, 0.0)
            };
            commands.spawn(DroneBundle::new(
                faction,
                origin_pos.offset(offset.0, offset.1),
                target_pos,
                *order,
            ));
        }
        garrison.set_drone_count(1);

        tracing::debug!(?entity, target = ?order.target, wave_size, "wave launched");
    }
}

/// Spawned -> Resolved.
///
/// Drones arriving at the same target in one tick are applied one after
/// another, each seeing the state the previous one left behind.
///
/// ## Data Access
/// - Reads: SimConfig, AttackOrder, Movement, drone Faction
/// - Writes: GameState, target Garrison / Faction / Shield; despawns drones via Commands
pub fn drone_impact_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    mut game_state: ResMut<GameState>,
    drones: Query<(Entity, &AttackOrder, &Movement, &Faction), With<Drone>>,
    mut targets: Query<(&mut Garrison, &mut Faction, Option<&mut Shield>), Without<Drone>>,
) {
    for (drone, order, movement, &attacker) in drones.iter() {
        if !movement.has_arrived() {
            continue;
        }
        // No matter what, the drone is spent
        commands.entity(drone).despawn();

        let Ok((mut garrison, mut owner, shield)) = targets.get_mut(order.target) else {
            tracing::warn!(target = ?order.target, "drone arrived at a missing garrison");
            game_state.lose(attacker, 1);
            continue;
        };
        if shield.is_none() {
            tracing::warn!(target = ?order.target, "attacked garrison has no shield");
        }

        let outcome = resolve_impact(
            attacker,
            &mut garrison,
            &mut owner,
            shield.map(|s| s.into_inner()),
            config.shield_decrement_step,
        );

        match outcome {
            ImpactOutcome::Parked => {}
            ImpactOutcome::Absorbed => game_state.lose(attacker, 1),
            ImpactOutcome::Attrition { defender } => {
                game_state.lose(attacker, 1);
                game_state.lose(defender, 1);
            }
            ImpactOutcome::Conquest { previous } => {
                tracing::info!(
                    target = ?order.target,
                    from = previous.label(),
                    to = attacker.label(),
                    "garrison conquered"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(drones: u32, shield: f32) -> (Garrison, Faction, Shield) {
        (Garrison::new(drones), Faction::Player1, Shield::new(shield, 0.0))
    }

    #[test]
    fn test_conquest_rule() {
        let (mut garrison, mut owner, mut shield) = target(0, 0.0);
        let outcome = resolve_impact(Faction::Player2, &mut garrison, &mut owner, Some(&mut shield), 1.0);
        assert_eq!(outcome, ImpactOutcome::Conquest { previous: Faction::Player1 });
        assert_eq!(owner, Faction::Player2);
        assert_eq!(garrison.drone_count(), 1);
    }

    #[test]
    fn test_attrition_rule() {
        let (mut garrison, mut owner, mut shield) = target(3, 0.0);
        let outcome = resolve_impact(Faction::Player2, &mut garrison, &mut owner, Some(&mut shield), 1.0);
        assert_eq!(outcome, ImpactOutcome::Attrition { defender: Faction::Player1 });
        assert_eq!(garrison.drone_count(), 2);
        assert_eq!(owner, Faction::Player1);
    }

    #[test]
    fn test_shield_absorbs_hit() {
        let (mut garrison, mut owner, mut shield) = target(3, 5.0);
        let outcome = resolve_impact(Faction::Player2, &mut garrison, &mut owner, Some(&mut shield), 1.0);
        assert_eq!(outcome, ImpactOutcome::Absorbed);
        assert_eq!(shield.current, 4.0);
        assert_eq!(garrison.drone_count(), 3);
    }

    #[test]
    fn test_last_shield_point_falls_through_to_garrison() {
        let (mut garrison, mut owner, mut shield) = target(3, 0.6);
        let outcome = resolve_impact(Faction::Player2, &mut garrison, &mut owner, Some(&mut shield), 1.0);
        assert_eq!(shield.current, 0.0);
        assert_eq!(outcome, ImpactOutcome::Attrition { defender: Faction::Player1 });
    }

    #[test]
    fn test_missing_shield_counts_as_down() {
        let (mut garrison, mut owner, _) = target(0, 0.0);
        let outcome = resolve_impact(Faction::Player2, &mut garrison, &mut owner, None, 1.0);
        assert_eq!(outcome, ImpactOutcome::Conquest { previous: Faction::Player1 });
    }

    #[test]
    fn test_friendly_arrival_parks() {
        let (mut garrison, mut owner, mut shield) = target(3, 5.0);
        let outcome = resolve_impact(Faction::Player1, &mut garrison, &mut owner, Some(&mut shield), 1.0);
        assert_eq!(outcome, ImpactOutcome::Parked);
        assert_eq!(garrison.drone_count(), 4);
        assert_eq!(shield.current, 5.0);
    }

    // ------------------------------------------------------------------------
    // System-level tests
    // ------------------------------------------------------------------------

    fn combat_world() -> World {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        world.insert_resource(SeededRng::from_seed(7));
        world.insert_resource(GameState::default());
        world
    }

    fn spawn_garrison(world: &mut World, faction: Faction, x: f32, drones: u32, shield: f32) -> Entity {
        world
            .spawn(GarrisonBundle {
                garrison: Garrison::new(drones),
                faction,
                position: Position::new(x, 0.0),
                shield: Shield::new(shield, 0.0),
                ..Default::default()
            })
            .id()
    }

    fn run_combat(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((order_spawn_system, drone_impact_system).chain());
        schedule.run(world);
    }

    #[test]
    fn test_spawn_keeps_one_drone_home() {
        let mut world = combat_world();
        let origin = spawn_garrison(&mut world, Faction::Player2, 0.0, 5, 0.0);
        let target = spawn_garrison(&mut world, Faction::Player1, 500.0, 2, 0.0);
        world.entity_mut(origin).insert(AttackOrder::new(origin, target));

        run_combat(&mut world);

        assert_eq!(world.get::<Garrison>(origin).unwrap().drone_count(), 1);
        assert!(world.get::<AttackOrder>(origin).is_none());

        let config = SimConfig::default();
        let spread = config.spawn_spread(4);
        let mut query = world.query_filtered::<(&Position, &Movement, &AttackOrder, &Faction), With<Drone>>();
        let drones: Vec<_> = query.iter(&world).collect();
        assert_eq!(drones.len(), 4);
        for (pos, movement, order, faction) in drones {
            assert_eq!(*order, AttackOrder::new(origin, target));
            assert_eq!(*faction, Faction::Player2);
            assert_eq!(movement.target, Position::new(500.0, 0.0));
            assert!(movement.moving);
            assert!(pos.x.abs() <= spread && pos.y.abs() <= spread);
        }
    }

    #[test]
    fn test_spawn_aborts_below_two_drones() {
        let mut world = combat_world();
        let origin = spawn_garrison(&mut world, Faction::Player2, 0.0, 1, 0.0);
        let target = spawn_garrison(&mut world, Faction::Player1, 500.0, 2, 0.0);
        world.entity_mut(origin).insert(AttackOrder::new(origin, target));

        run_combat(&mut world);

        assert!(world.get::<AttackOrder>(origin).is_none());
        assert_eq!(world.get::<Garrison>(origin).unwrap().drone_count(), 1);
        let mut query = world.query_filtered::<Entity, With<Drone>>();
        assert_eq!(query.iter(&world).count(), 0);
    }

    fn arrived_drone(world: &mut World, faction: Faction, origin: Entity, target: Entity) -> Entity {
        let mut bundle = DroneBundle::new(faction, Position::default(), Position::default(), AttackOrder::new(origin, target));
        bundle.movement.moving = false;
        world.spawn(bundle).id()
    }

    #[test]
    fn test_impact_attrition_updates_both_counters() {
        let mut world = combat_world();
        let origin = spawn_garrison(&mut world, Faction::Player2, 0.0, 1, 0.0);
        let target = spawn_garrison(&mut world, Faction::Player1, 100.0, 3, 0.0);
        {
            let mut state = world.resource_mut::<GameState>();
            state.add(Faction::Player1, 10);
            state.add(Faction::Player2, 10);
        }
        let drone = arrived_drone(&mut world, Faction::Player2, origin, target);

        run_combat(&mut world);

        assert!(!world.entities().contains(drone));
        assert_eq!(world.get::<Garrison>(target).unwrap().drone_count(), 2);
        let state = world.resource::<GameState>();
        assert_eq!(state.live(Faction::Player1), 9);
        assert_eq!(state.live(Faction::Player2), 9);
    }

    #[test]
    fn test_impact_absorbed_costs_attacker_only() {
        let mut world = combat_world();
        let origin = spawn_garrison(&mut world, Faction::Player2, 0.0, 1, 0.0);
        let target = spawn_garrison(&mut world, Faction::Player1, 100.0, 3, 5.0);
        {
            let mut state = world.resource_mut::<GameState>();
            state.add(Faction::Player1, 10);
            state.add(Faction::Player2, 10);
        }
        arrived_drone(&mut world, Faction::Player2, origin, target);

        run_combat(&mut world);

        assert_eq!(world.get::<Shield>(target).unwrap().current, 4.0);
        assert_eq!(world.get::<Garrison>(target).unwrap().drone_count(), 3);
        let state = world.resource::<GameState>();
        assert_eq!(state.live(Faction::Player1), 10);
        assert_eq!(state.live(Faction::Player2), 9);
    }

    #[test]
    fn test_same_tick_wave_conquers_then_parks() {
        let mut world = combat_world();
        let origin = spawn_garrison(&mut world, Faction::Player2, 0.0, 1, 0.0);
        let target = spawn_garrison(&mut world, Faction::Neutral, 100.0, 1, 2.0);
        for _ in 0..4 {
            arrived_drone(&mut world, Faction::Player2, origin, target);
        }

        run_combat(&mut world);

        // shield, defender, conquest, park
        assert_eq!(*world.get::<Faction>(target).unwrap(), Faction::Player2);
        assert_eq!(world.get::<Garrison>(target).unwrap().drone_count(), 2);
        assert_eq!(world.get::<Shield>(target).unwrap().current, 0.0);
        let mut query = world.query_filtered::<Entity, With<Drone>>();
        assert_eq!(query.iter(&world).count(), 0);
    }

    #[test]
    fn test_drone_uses_its_own_faction_not_origin() {
        let mut world = combat_world();
        // Origin was captured by Player1 after the wave left
        let origin = spawn_garrison(&mut world, Faction::Player1, 0.0, 1, 0.0);
        let target = spawn_garrison(&mut world, Faction::Player2, 100.0, 2, 0.0);
        arrived_drone(&mut world, Faction::Player2, origin, target);

        run_combat(&mut world);

        assert_eq!(world.get::<Garrison>(target).unwrap().drone_count(), 3);
    }

    #[test]
    fn test_in_flight_drone_is_untouched() {
        let mut world = combat_world();
        let origin = spawn_garrison(&mut world, Faction::Player2, 0.0, 1, 0.0);
        let target = spawn_garrison(&mut world, Faction::Player1, 100.0, 2, 0.0);
        let drone = world
            .spawn(DroneBundle::new(
                Faction::Player2,
                Position::default(),
                Position::new(100.0, 0.0),
                AttackOrder::new(origin, target),
            ))
            .id();

        run_combat(&mut world);

        assert!(world.entities().contains(drone));
        assert_eq!(world.get::<Garrison>(target).unwrap().drone_count(), 2);
    }
}
