//! Per-tick velocity integration, friction, boundary reflection, and the
//! anti-cheat speed clamp.

use jelly_ecs::world::World;

use crate::constants::SimConstants;

const TIME_SCALE: f32 = 1.0;

/// Integrates `Physics`/`Transform` for every active entity by one fixed
/// tick. Stateless: all tunables come from `SimConstants`, so two instances
/// fed identical Worlds and `dt` sequences produce identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance every active entity by `dt` seconds.
    ///
    /// Returns the slot indices that went NaN/Inf this tick so the caller
    /// can quarantine them (deactivate); `PhysicsSystem` itself never
    /// deactivates, to keep this function a pure transform over the active
    /// set it was called with.
    pub fn update(&self, world: &mut World, dt: f32, constants: &SimConstants) -> Vec<u16> {
        let mut quarantine = Vec::new();
        let max_speed_sq = (constants.max_speed_base * constants.speed_validation_tolerance)
            * (constants.max_speed_base * constants.speed_validation_tolerance);

        let active: Vec<u16> = world.active_iter().collect();
        for idx in active {
            let radius = world.physics(idx).radius;

            let friction_exp = dt * constants.tick_hz;
            let friction_effective = if (friction_exp - 1.0).abs() < 0.01 {
                constants.friction_base
            } else {
                constants.friction_base.powf(friction_exp)
            };

            {
                let physics = world.physics_mut(idx);
                physics.vx *= friction_effective;
                physics.vy *= friction_effective;
            }

            {
                let transform = world.transform_mut(idx);
                transform.prev_x = transform.x;
                transform.prev_y = transform.y;
                transform.prev_rotation = transform.rotation;
            }

            let (vx, vy) = {
                let physics = world.physics(idx);
                (physics.vx, physics.vy)
            };
            {
                let transform = world.transform_mut(idx);
                transform.x += vx * dt * TIME_SCALE;
                transform.y += vy * dt * TIME_SCALE;
            }

            self.clamp_to_boundary(world, idx, radius, constants);
            self.clamp_speed(world, idx, max_speed_sq, constants);

            let transform = world.transform(idx);
            let physics = world.physics(idx);
            if !transform.x.is_finite()
                || !transform.y.is_finite()
                || !physics.vx.is_finite()
                || !physics.vy.is_finite()
            {
                quarantine.push(idx);
            }
        }
        quarantine
    }

    fn clamp_to_boundary(&self, world: &mut World, idx: u16, radius: f32, constants: &SimConstants) {
        let limit = constants.map_radius_phy - radius;
        let (x, y) = {
            let t = world.transform(idx);
            (t.x, t.y)
        };
        let dist_sq = x * x + y * y;
        if dist_sq <= limit * limit || dist_sq == 0.0 {
            return;
        }

        let dist = dist_sq.sqrt();
        let (nx, ny) = (x / dist, y / dist);

        {
            let t = world.transform_mut(idx);
            t.x = nx * limit;
            t.y = ny * limit;
        }

        const ELASTIC: f32 = 1.5;
        let physics = world.physics_mut(idx);
        let v_dot_n = physics.vx * nx + physics.vy * ny;
        if v_dot_n > 0.0 {
            physics.vx -= (1.0 + ELASTIC) * v_dot_n * nx;
            physics.vy -= (1.0 + ELASTIC) * v_dot_n * ny;
        }
    }

    fn clamp_speed(&self, world: &mut World, idx: u16, max_speed_sq: f32, constants: &SimConstants) {
        let physics = world.physics_mut(idx);
        let speed_sq = physics.vx * physics.vx + physics.vy * physics.vy;
        if speed_sq > max_speed_sq {
            let max_speed = constants.max_speed_base * constants.speed_validation_tolerance;
            let speed = speed_sq.sqrt();
            let scale = max_speed / speed;
            physics.vx *= scale;
            physics.vy *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jelly_ecs::prelude::*;

    fn spawn_at(world: &mut World, x: f32, y: f32, vx: f32, vy: f32) -> u16 {
        let handle = world.allocate().unwrap();
        let idx = world.index_of(handle).unwrap();
        *world.transform_mut(idx) = Transform {
            x,
            y,
            ..Default::default()
        };
        *world.physics_mut(idx) = Physics {
            vx,
            vy,
            radius: 20.0,
            ..Default::default()
        };
        world.activate(idx);
        idx
    }

    #[test]
    fn prev_position_equals_previous_tick_position() {
        let mut world = World::new(8);
        let constants = SimConstants {
            friction_base: 1.0,
            ..Default::default()
        };
        let idx = spawn_at(&mut world, 0.0, 0.0, 10.0, 0.0);
        let system = PhysicsSystem;

        let dt = 1.0 / constants.tick_hz;
        system.update(&mut world, dt, &constants);
        let x_after_first = world.transform(idx).x;

        system.update(&mut world, dt, &constants);
        assert_eq!(world.transform(idx).prev_x, x_after_first);
    }

    #[test]
    fn boundary_reflection_keeps_entity_inside_physics_radius() {
        let mut world = World::new(8);
        let constants = SimConstants::default();
        let idx = spawn_at(
            &mut world,
            constants.map_radius_phy - 1.0,
            0.0,
            5000.0,
            0.0,
        );
        let system = PhysicsSystem;

        for _ in 0..30 {
            system.update(&mut world, constants.fixed_dt, &constants);
            let t = world.transform(idx);
            let dist_sq = t.x * t.x + t.y * t.y;
            let limit = constants.map_radius_phy - world.physics(idx).radius;
            assert!(dist_sq <= limit * limit + 1.0);
        }
    }

    #[test]
    fn anti_cheat_clamp_bounds_speed() {
        let mut world = World::new(8);
        let constants = SimConstants::default();
        let idx = spawn_at(&mut world, 0.0, 0.0, 100_000.0, 0.0);
        let system = PhysicsSystem;

        system.update(&mut world, constants.fixed_dt, &constants);

        let physics = world.physics(idx);
        let speed_sq = physics.vx * physics.vx + physics.vy * physics.vy;
        let max = constants.max_speed_base * constants.speed_validation_tolerance;
        assert!(speed_sq <= max * max + 1.0);
    }

    #[test]
    fn friction_fast_path_matches_pow_path_at_nominal_dt() {
        let constants = SimConstants::default();
        let dt = constants.fixed_dt;
        let exp = dt * constants.tick_hz;
        assert!((exp - 1.0).abs() < 0.01);
        assert_eq!(constants.friction_base, constants.friction_base.powf(1.0));
    }
}
