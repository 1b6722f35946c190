//! Seek-toward-target steering, applied before `PhysicsSystem` each tick.

use jelly_ecs::world::World;

const ACC: f32 = 2000.0;
const DEADZONE_SQ: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct MovementSystem;

impl MovementSystem {
    pub fn update_all(&self, world: &mut World, dt: f32) {
        let active: Vec<u16> = world.active_iter().collect();
        for idx in active {
            let (target_x, target_y) = {
                let input = world.input(idx);
                (input.target_x, input.target_y)
            };
            let (x, y) = {
                let t = world.transform(idx);
                (t.x, t.y)
            };

            let dx = target_x - x;
            let dy = target_y - y;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq < DEADZONE_SQ {
                continue;
            }

            let dist = dist_sq.sqrt();
            let ax = dx / dist * ACC * dt;
            let ay = dy / dist * ACC * dt;

            let (max_speed, speed_mult) = {
                let cfg = world.config(idx);
                (cfg.max_speed, cfg.speed_mult)
            };
            let effective_max_speed = max_speed * speed_mult;

            let physics = world.physics_mut(idx);
            physics.vx += ax;
            physics.vy += ay;

            let speed_sq = physics.vx * physics.vx + physics.vy * physics.vy;
            let max_sq = effective_max_speed * effective_max_speed;
            if speed_sq > max_sq && speed_sq > 0.0 {
                let scale = effective_max_speed / speed_sq.sqrt();
                physics.vx *= scale;
                physics.vy *= scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jelly_ecs::prelude::*;

    fn spawn_seeking(world: &mut World, target_x: f32, max_speed: f32) -> u16 {
        let handle = world.allocate().unwrap();
        let idx = world.index_of(handle).unwrap();
        *world.input_mut(idx) = Input {
            target_x,
            target_y: 0.0,
            ..Default::default()
        };
        *world.config_mut(idx) = Config {
            max_speed,
            speed_mult: 1.0,
            ..Default::default()
        };
        world.activate(idx);
        idx
    }

    #[test]
    fn deadzone_suppresses_tiny_corrections() {
        let mut world = World::new(4);
        let idx = spawn_seeking(&mut world, 0.5, 150.0);
        MovementSystem.update_all(&mut world, 1.0 / 60.0);
        let physics = world.physics(idx);
        assert_eq!(physics.vx, 0.0);
        assert_eq!(physics.vy, 0.0);
    }

    #[test]
    fn velocity_clamped_to_effective_max_speed() {
        let mut world = World::new(4);
        let idx = spawn_seeking(&mut world, 10_000.0, 150.0);
        for _ in 0..200 {
            MovementSystem.update_all(&mut world, 1.0 / 60.0);
        }
        let physics = world.physics(idx);
        let speed_sq = physics.vx * physics.vx + physics.vy * physics.vy;
        assert!(speed_sq <= 150.0 * 150.0 + 1.0);
    }
}
