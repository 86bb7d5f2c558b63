//! Movement system - carries drones toward their target garrison.

use crate::components::*;
use crate::config::SimConfig;
use bevy_ecs::prelude::*;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// System that advances every moving entity toward its target at drone speed.
/// Entities within reach this tick snap onto the target and stop.
pub fn drone_movement_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut query: Query<(&mut Position, &mut Movement)>,
) {
    let step = config.drone_speed * dt.0;
    for (mut pos, mut movement) in query.iter_mut() {
        if !movement.moving {
            continue;
        }

        let dx = movement.target.x - pos.x;
        let dy = movement.target.y - pos.y;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist <= step.max(config.arrival_radius) {
            // Arrived at destination
            *pos = movement.target;
            movement.moving = false;
        } else {
            pos.x += (dx / dist) * step;
            pos.y += (dy / dist) * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_movement(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(drone_movement_system);
        schedule.run(world);
    }

    #[test]
    fn test_movement_advances_toward_target() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.5));
        world.insert_resource(SimConfig {
            drone_speed: 10.0,
            ..Default::default()
        });
        world.spawn((Position::new(0.0, 0.0), Movement::toward(Position::new(30.0, 40.0))));

        run_movement(&mut world);

        let mut query = world.query::<(&Position, &Movement)>();
        let (pos, movement) = query.single(&world);
        assert!((pos.x - 3.0).abs() < 0.001);
        assert!((pos.y - 4.0).abs() < 0.001);
        assert!(movement.moving);
    }

    #[test]
    fn test_movement_snaps_on_arrival() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));
        world.insert_resource(SimConfig {
            drone_speed: 100.0,
            ..Default::default()
        });
        world.spawn((Position::new(0.0, 0.0), Movement::toward(Position::new(60.0, 0.0))));

        run_movement(&mut world);

        let mut query = world.query::<(&Position, &Movement)>();
        let (pos, movement) = query.single(&world);
        assert_eq!(*pos, Position::new(60.0, 0.0));
        assert!(movement.has_arrived());
    }
}
