//! The fixed-capacity World: parallel component arrays plus the active
//! sparse set
//!
//! Every slot carries every component row up front instead of being grouped
//! by archetype. There is no migration cost and no archetype lookup: the
//! tradeoff is O(1) indexed access over a fixed `N_MAX`, not minimal
//! per-entity memory for sparse component sets.

use crate::allocator::{ActiveSet, EntityAllocator};
use crate::components::{Config, Input, Physics, Pigment, Ring, Skill, Stats, Transform};
use crate::handle::EntityHandle;
use crate::EcsError;

/// Default fixed capacity when a room does not override it.
pub const DEFAULT_N_MAX: u16 = 4096;

/// The top-level fixed-capacity ECS container.
pub struct World {
    allocator: EntityAllocator,
    active: ActiveSet,

    transform: Vec<Transform>,
    physics: Vec<Physics>,
    stats: Vec<Stats>,
    input: Vec<Input>,
    config: Vec<Config>,
    skill: Vec<Skill>,
    pigment: Vec<Pigment>,
    ring: Vec<Ring>,
    state: Vec<u16>,
}

impl World {
    /// Create a world with the given fixed capacity (`N_MAX`).
    pub fn new(capacity: u16) -> Self {
        let n = capacity as usize;
        Self {
            allocator: EntityAllocator::new(capacity),
            active: ActiveSet::new(capacity),
            transform: vec![Transform::default(); n],
            physics: vec![Physics::default(); n],
            stats: vec![Stats::default(); n],
            input: vec![Input::default(); n],
            config: vec![Config::default(); n],
            skill: vec![Skill::default(); n],
            pigment: vec![Pigment::default(); n],
            ring: vec![Ring::default(); n],
            state: vec![0u16; n],
        }
    }

    pub fn capacity(&self) -> u16 {
        self.allocator.capacity()
    }

    // -- entity lifecycle -----------------------------------------------

    /// Allocate a slot and return its handle. Does not activate the slot or
    /// touch component data; callers (typically `Room::join` or
    /// `WaveSpawner`) initialize components before calling [`World::activate`].
    pub fn allocate(&mut self) -> Result<EntityHandle, EcsError> {
        self.allocator.allocate()
    }

    /// Release a slot: zero every component row, clear state flags, remove
    /// from the active set, and return the index to the allocator's free
    /// list. Releasing an already-released handle is a no-op.
    pub fn release(&mut self, handle: EntityHandle) {
        let Some(index) = self.allocator.index_of(handle) else {
            return;
        };
        let i = index as usize;
        self.transform[i] = Transform::default();
        self.physics[i] = Physics::default();
        self.stats[i] = Stats::default();
        self.input[i] = Input::default();
        self.config[i] = Config::default();
        self.skill[i] = Skill::default();
        self.pigment[i] = Pigment::default();
        self.ring[i] = Ring::default();
        self.state[i] = 0;
        self.active.deactivate(index);
        self.allocator.release(index);
    }

    pub fn is_valid(&self, handle: EntityHandle) -> bool {
        self.allocator.is_valid(handle)
    }

    pub fn index_of(&self, handle: EntityHandle) -> Option<u16> {
        self.allocator.index_of(handle)
    }

    /// Rebuild a fresh handle for `index` from the allocator's current
    /// generation. Used by `Room`'s ABA recovery path when a client reconnects with a stale index.
    pub fn current_handle(&self, index: u16) -> Option<EntityHandle> {
        self.allocator.current_handle(index)
    }

    pub fn alive_count(&self) -> usize {
        self.allocator.alive_count()
    }

    // -- active set -------------------------------------------------------

    /// Add `index` to the active dense list and set the `ACTIVE` flag.
    pub fn activate(&mut self, index: u16) {
        self.active.activate(index);
        self.state[index as usize] |= crate::components::flags::ACTIVE;
    }

    /// Remove `index` from the active dense list and clear the `ACTIVE` flag.
    pub fn deactivate(&mut self, index: u16) {
        self.active.deactivate(index);
        self.state[index as usize] &= !crate::components::flags::ACTIVE;
    }

    pub fn is_active(&self, index: u16) -> bool {
        self.active.contains(index)
    }

    /// Iterate over all currently-active slot ids.
    pub fn active_iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.active.iter()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    // -- component accessors ----------------------------------------------
    //
    // Plain indexed access, not `Option`-wrapped: callers only ever index
    // with a slot obtained from `index_of`/`active_iter`, both of which are
    // bounds-checked at the point they're produced, so there are no
    // repeated validity checks inside a tight per-entity loop.

    pub fn transform(&self, i: u16) -> &Transform {
        &self.transform[i as usize]
    }
    pub fn transform_mut(&mut self, i: u16) -> &mut Transform {
        &mut self.transform[i as usize]
    }
    pub fn physics(&self, i: u16) -> &Physics {
        &self.physics[i as usize]
    }
    pub fn physics_mut(&mut self, i: u16) -> &mut Physics {
        &mut self.physics[i as usize]
    }
    pub fn stats(&self, i: u16) -> &Stats {
        &self.stats[i as usize]
    }
    pub fn stats_mut(&mut self, i: u16) -> &mut Stats {
        &mut self.stats[i as usize]
    }
    pub fn input(&self, i: u16) -> &Input {
        &self.input[i as usize]
    }
    pub fn input_mut(&mut self, i: u16) -> &mut Input {
        &mut self.input[i as usize]
    }
    pub fn config(&self, i: u16) -> &Config {
        &self.config[i as usize]
    }
    pub fn config_mut(&mut self, i: u16) -> &mut Config {
        &mut self.config[i as usize]
    }
    pub fn skill(&self, i: u16) -> &Skill {
        &self.skill[i as usize]
    }
    pub fn skill_mut(&mut self, i: u16) -> &mut Skill {
        &mut self.skill[i as usize]
    }
    pub fn pigment(&self, i: u16) -> &Pigment {
        &self.pigment[i as usize]
    }
    pub fn pigment_mut(&mut self, i: u16) -> &mut Pigment {
        &mut self.pigment[i as usize]
    }
    pub fn ring(&self, i: u16) -> Ring {
        self.ring[i as usize]
    }
    pub fn set_ring(&mut self, i: u16, ring: Ring) {
        self.ring[i as usize] = ring;
    }

    pub fn state(&self, i: u16) -> u16 {
        self.state[i as usize]
    }

    pub fn set_flag(&mut self, i: u16, flag: u16) {
        self.state[i as usize] |= flag;
    }

    pub fn clear_flag(&mut self, i: u16, flag: u16) {
        self.state[i as usize] &= !flag;
    }

    pub fn has_flag(&self, i: u16, flag: u16) -> bool {
        self.state[i as usize] & flag != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::flags;

    #[test]
    fn allocate_activate_roundtrip() {
        let mut world = World::new(8);
        let h = world.allocate().unwrap();
        let idx = world.index_of(h).unwrap();
        world.transform_mut(idx).x = 5.0;
        world.activate(idx);

        assert!(world.is_active(idx));
        assert!(world.has_flag(idx, flags::ACTIVE));
        assert_eq!(world.transform(idx).x, 5.0);
    }

    #[test]
    fn release_zeroes_components_and_deactivates() {
        let mut world = World::new(8);
        let h = world.allocate().unwrap();
        let idx = world.index_of(h).unwrap();
        world.transform_mut(idx).x = 5.0;
        world.activate(idx);

        world.release(h);

        assert!(!world.is_valid(h));
        assert!(!world.is_active(idx));
        assert_eq!(world.transform(idx).x, 0.0);
        assert_eq!(world.state(idx), 0);
    }

    #[test]
    fn active_iff_flag_set_invariant() {
        let mut world = World::new(16);
        let mut handles = Vec::new();
        for _ in 0..5 {
            let h = world.allocate().unwrap();
            let idx = world.index_of(h).unwrap();
            world.activate(idx);
            handles.push(h);
        }
        for idx in 0..world.capacity() {
            assert_eq!(world.is_active(idx), world.has_flag(idx, flags::ACTIVE));
        }
        // Deactivate one and recheck globally.
        let idx0 = world.index_of(handles[2]).unwrap();
        world.deactivate(idx0);
        for idx in 0..world.capacity() {
            assert_eq!(world.is_active(idx), world.has_flag(idx, flags::ACTIVE));
        }
    }

    #[test]
    fn release_idempotent() {
        let mut world = World::new(4);
        let h = world.allocate().unwrap();
        world.release(h);
        world.release(h); // no-op, must not panic or corrupt state
        assert!(!world.is_valid(h));
    }
}
