//! jelly-ecs -- fixed-capacity Data-Oriented entity storage.
//!
//! Parallel numeric component arrays indexed by entity slot, a sparse-set
//! active list, and generational handles for ABA-safe references across
//! tick and network boundaries.
//!
//! This is a fixed-capacity sibling of an archetype ECS: there is exactly
//! one World per room, no migration, and every slot carries every
//! component row up front, trading per-entity memory for O(1) indexed
//! access over a bounded `N_MAX`.

pub mod allocator;
pub mod components;
pub mod dirty;
pub mod handle;
pub mod world;

/// Errors produced by `jelly-ecs` operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// `World::allocate` was called with no free slots and the watermark at
    /// capacity (`N_MAX`).
    #[error("entity pool exhausted: all slots are in use")]
    PoolExhausted,
}

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::allocator::{ActiveSet, EntityAllocator};
    pub use crate::components::{
        dirty_mask, flags, Config, Input, Physics, Pigment, Ring, Skill, Stats, Transform,
        ACTION_PRIMARY, ACTION_SECONDARY,
    };
    pub use crate::dirty::DirtyTracker;
    pub use crate::handle::EntityHandle;
    pub use crate::world::{World, DEFAULT_N_MAX};
    pub use crate::EcsError;
}
