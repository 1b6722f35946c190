//! jelly-sim -- the deterministic gameplay systems that advance a `World`
//! by one fixed tick: movement, physics integration, skill cooldowns, ring
//! progression, and wave spawning, plus the engine event ring buffer systems
//! push notable occurrences onto for the transport layer to drain.
//!
//! Every system here is a plain function over `&mut jelly_ecs::World` (and,
//! for the spawner, a seeded PRNG) with no hidden state beyond what's passed
//! in, so a whole tick is reproducible byte-for-byte from the same World,
//! PRNG state, and fixed `dt`.

pub mod constants;
pub mod events;
pub mod movement;
pub mod physics;
pub mod ring;
pub mod skill;
pub mod spawner;

pub mod prelude {
    pub use crate::constants::{RingRadii, SimConstants};
    pub use crate::events::{EngineEvent, EventKind, EventRing};
    pub use crate::movement::MovementSystem;
    pub use crate::physics::PhysicsSystem;
    pub use crate::ring::{RingSystem, RingThresholds};
    pub use crate::skill::SkillSystem;
    pub use crate::spawner::{PigmentPrimary, SpawnKind, WaveConfig, WaveSpawner};
}
