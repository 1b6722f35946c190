//! Cooldown decay and one-shot skill activation from the primary action bit.

use jelly_ecs::components::ACTION_PRIMARY;
use jelly_ecs::world::World;

use crate::events::{EngineEvent, EventKind, EventRing};

#[derive(Debug, Clone, Copy, Default)]
pub struct SkillSystem;

impl SkillSystem {
    /// Decrement cooldown/active timers and consume the primary action bit.
    /// Firing pushes `SKILL_FIRED` onto `events`; a bit consumed while on
    /// cooldown is cleared without firing.
    pub fn update(&self, world: &mut World, dt: f32, events: &mut EventRing) {
        let active: Vec<u16> = world.active_iter().collect();
        for idx in active {
            {
                let skill = world.skill_mut(idx);
                skill.cooldown = (skill.cooldown - dt).max(0.0);
                skill.active_timer = (skill.active_timer - dt).max(0.0);
            }

            let actions = world.input(idx).actions();
            if actions & ACTION_PRIMARY == 0 {
                continue;
            }

            let on_cooldown = world.skill(idx).cooldown > 0.0;
            if on_cooldown {
                let input = world.input_mut(idx);
                let cleared = input.actions() & !ACTION_PRIMARY;
                input.set_actions(cleared);
                continue;
            }

            let max_cooldown = world.skill(idx).max_cooldown;
            {
                let skill = world.skill_mut(idx);
                skill.cooldown = max_cooldown;
                skill.active_timer = skill.active_timer.max(0.0);
            }
            {
                let input = world.input_mut(idx);
                let cleared = input.actions() & !ACTION_PRIMARY;
                input.set_actions(cleared);
            }
            events.push(EngineEvent::new(EventKind::SkillFired, idx));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jelly_ecs::prelude::*;

    fn spawn_with_skill(world: &mut World, cooldown: f32, max_cooldown: f32) -> u16 {
        let handle = world.allocate().unwrap();
        let idx = world.index_of(handle).unwrap();
        *world.skill_mut(idx) = Skill {
            cooldown,
            max_cooldown,
            ..Default::default()
        };
        world.activate(idx);
        idx
    }

    #[test]
    fn fires_when_off_cooldown_and_resets_cooldown() {
        let mut world = World::new(4);
        let mut events = EventRing::new(16);
        let idx = spawn_with_skill(&mut world, 0.0, 2.0);
        world.input_mut(idx).set_actions(ACTION_PRIMARY);

        SkillSystem.update(&mut world, 1.0 / 60.0, &mut events);

        assert_eq!(world.skill(idx).cooldown, 2.0);
        assert_eq!(world.input(idx).actions() & ACTION_PRIMARY, 0);
        assert_eq!(events.drain().len(), 1);
    }

    #[test]
    fn on_cooldown_clears_bit_without_firing() {
        let mut world = World::new(4);
        let mut events = EventRing::new(16);
        let idx = spawn_with_skill(&mut world, 1.0, 2.0);
        world.input_mut(idx).set_actions(ACTION_PRIMARY);

        SkillSystem.update(&mut world, 1.0 / 60.0, &mut events);

        assert!(world.skill(idx).cooldown > 0.0);
        assert_eq!(world.input(idx).actions() & ACTION_PRIMARY, 0);
        assert!(events.drain().is_empty());
    }

    #[test]
    fn cooldown_floors_at_zero() {
        let mut world = World::new(4);
        let mut events = EventRing::new(16);
        let idx = spawn_with_skill(&mut world, 0.005, 2.0);

        SkillSystem.update(&mut world, 1.0, &mut events);
        assert_eq!(world.skill(idx).cooldown, 0.0);
    }
}
