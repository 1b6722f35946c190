//! Ring progression: elastic rejection at an unmet gate, hard inward-only
//! clamping once committed, and the one-way invariant on the innermost ring.

use jelly_ecs::components::Ring;
use jelly_ecs::world::World;

use crate::constants::SimConstants;
use crate::events::{EngineEvent, EventKind, EventRing};

/// Match-percent thresholds gating ring commitment, plus the buff durations
/// and multipliers granted on commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingThresholds {
    pub t2: f32,
    pub t3: f32,
    pub speed_buff_mult: f32,
    pub speed_buff_duration: f32,
    pub shield_duration: f32,
}

impl Default for RingThresholds {
    fn default() -> Self {
        Self {
            t2: 0.4,
            t3: 0.75,
            speed_buff_mult: 1.3,
            speed_buff_duration: 3.0,
            shield_duration: 2.0,
        }
    }
}

const SPRING_K: f32 = 5.0;
const DAMPING_C: f32 = 0.2;
const MEMBRANE_THICKNESS: f32 = 50.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct RingSystem;

impl RingSystem {
    /// Evaluate ring transitions for every active entity. Runs after
    /// `PhysicsSystem` so it sees this tick's integrated position.
    pub fn update(
        &self,
        world: &mut World,
        constants: &SimConstants,
        thresholds: &RingThresholds,
        events: &mut EventRing,
    ) {
        let active: Vec<u16> = world.active_iter().collect();
        for idx in active {
            let (x, y) = {
                let t = world.transform(idx);
                (t.x, t.y)
            };
            let dist_sq = x * x + y * y;
            let ring = world.ring(idx);

            match ring {
                Ring::Outer => {
                    if dist_sq < constants.ring_radii.r2 * constants.ring_radii.r2 {
                        let match_percent = world.stats(idx).match_percent;
                        if match_percent >= thresholds.t2 {
                            self.commit(world, idx, Ring::Mid, thresholds, events);
                        } else {
                            self.reject(world, idx, x, y, dist_sq, constants.ring_radii.r2);
                        }
                    }
                }
                Ring::Mid => {
                    let r2 = constants.ring_radii.r2;
                    let r3 = constants.ring_radii.r3;
                    if dist_sq < r3 * r3 {
                        let match_percent = world.stats(idx).match_percent;
                        if match_percent >= thresholds.t3 {
                            self.commit(world, idx, Ring::Inner, thresholds, events);
                        } else {
                            self.reject(world, idx, x, y, dist_sq, r3);
                        }
                    } else if dist_sq > r2 * r2 {
                        self.clamp_outward(world, idx, x, y, dist_sq, r2);
                    }
                }
                Ring::Inner => {
                    let r3 = constants.ring_radii.r3;
                    if dist_sq > r3 * r3 {
                        self.clamp_outward(world, idx, x, y, dist_sq, r3);
                    }
                }
            }
        }
    }

    fn commit(
        &self,
        world: &mut World,
        idx: u16,
        to: Ring,
        thresholds: &RingThresholds,
        events: &mut EventRing,
    ) {
        world.set_ring(idx, to);
        let config = world.config_mut(idx);
        config.speed_mult = thresholds.speed_buff_mult;
        config.buff_timer = thresholds.speed_buff_duration;
        if to == Ring::Inner {
            world.stats_mut(idx).shield_timer = thresholds.shield_duration;
        }
        events.push(EngineEvent::new(EventKind::RingCommit, idx));
    }

    /// Penetration spring + damping against a boundary the entity hasn't
    /// earned the right to cross; clamps instead once penetration exceeds
    /// the membrane thickness.
    fn reject(&self, world: &mut World, idx: u16, x: f32, y: f32, dist_sq: f32, radius_limit: f32) {
        let dist = dist_sq.sqrt();
        let pen = radius_limit - dist;
        if pen > MEMBRANE_THICKNESS {
            self.clamp_outward(world, idx, x, y, dist_sq, radius_limit);
            return;
        }

        let (nx, ny) = (x / dist, y / dist);
        const FIXED_DT: f32 = 1.0 / 60.0;
        let physics = world.physics_mut(idx);
        physics.vx += nx * pen * SPRING_K * FIXED_DT;
        physics.vy += ny * pen * SPRING_K * FIXED_DT;
        physics.vx *= 1.0 - DAMPING_C;
        physics.vy *= 1.0 - DAMPING_C;
    }

    /// Hard-clamp to the boundary surface, zeroing the outward normal
    /// velocity component so a committed ring can never be un-crossed.
    fn clamp_outward(&self, world: &mut World, idx: u16, x: f32, y: f32, dist_sq: f32, radius_limit: f32) {
        let dist = dist_sq.sqrt();
        if dist == 0.0 {
            return;
        }
        let (nx, ny) = (x / dist, y / dist);

        {
            let t = world.transform_mut(idx);
            t.x = nx * radius_limit;
            t.y = ny * radius_limit;
        }

        let physics = world.physics_mut(idx);
        let v_dot_n = physics.vx * nx + physics.vy * ny;
        if v_dot_n > 0.0 {
            physics.vx -= v_dot_n * nx;
            physics.vy -= v_dot_n * ny;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jelly_ecs::prelude::*;

    fn spawn_in_ring(world: &mut World, ring: Ring, x: f32, y: f32, match_percent: f32) -> u16 {
        let handle = world.allocate().unwrap();
        let idx = world.index_of(handle).unwrap();
        world.set_ring(idx, ring);
        *world.transform_mut(idx) = Transform {
            x,
            y,
            ..Default::default()
        };
        world.stats_mut(idx).match_percent = match_percent;
        world.config_mut(idx).speed_mult = 1.0;
        world.activate(idx);
        idx
    }

    #[test]
    fn elastic_rejection_below_threshold_keeps_entity_outside() {
        let constants = SimConstants::default();
        let thresholds = RingThresholds::default();
        let mut events = EventRing::new(16);
        let mut world = World::new(4);
        let r2 = constants.ring_radii.r2;
        let idx = spawn_in_ring(&mut world, Ring::Outer, r2 - 1.0, 0.0, thresholds.t2 - 0.01);

        RingSystem.update(&mut world, &constants, &thresholds, &mut events);

        assert_eq!(world.ring(idx), Ring::Outer);
        let t = world.transform(idx);
        assert!((t.x * t.x + t.y * t.y).sqrt() >= r2 - 2.0);
    }

    #[test]
    fn commits_above_threshold_and_grants_buff() {
        let constants = SimConstants::default();
        let thresholds = RingThresholds::default();
        let mut events = EventRing::new(16);
        let mut world = World::new(4);
        let r2 = constants.ring_radii.r2;
        let idx = spawn_in_ring(&mut world, Ring::Outer, r2 - 1.0, 0.0, thresholds.t2 + 0.01);

        RingSystem.update(&mut world, &constants, &thresholds, &mut events);

        assert_eq!(world.ring(idx), Ring::Mid);
        assert_eq!(world.config(idx).speed_mult, thresholds.speed_buff_mult);
        assert_eq!(events.drain().len(), 1);
    }

    #[test]
    fn ring_three_is_one_way() {
        let constants = SimConstants::default();
        let thresholds = RingThresholds::default();
        let mut events = EventRing::new(16);
        let mut world = World::new(4);
        let r3 = constants.ring_radii.r3;
        let idx = spawn_in_ring(&mut world, Ring::Inner, r3 - 10.0, 0.0, 1.0);
        world.physics_mut(idx).vx = 1000.0;

        for _ in 0..10 {
            let vx = world.physics(idx).vx;
            world.transform_mut(idx).x += vx / 60.0;
            RingSystem.update(&mut world, &constants, &thresholds, &mut events);
            let t = world.transform(idx);
            assert!((t.x * t.x + t.y * t.y).sqrt() <= r3 + 0.01);
            assert_eq!(world.ring(idx), Ring::Inner);
        }
    }
}
