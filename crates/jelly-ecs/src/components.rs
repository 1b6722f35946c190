//! Component row definitions for the fixed-capacity [`crate::world::World`].
//!
//! Each component is a small `Copy` struct stored in a flat `Vec<T>` indexed
//! by entity slot. There is no archetype migration: every slot has every
//! component row allocated up front, and presence/absence of gameplay
//! meaning is expressed through state flags rather than through storage
//! layout.

use serde::{Deserialize, Serialize};

/// Transform component: position, rotation, scale, and the previous-tick
/// snapshot used for client-side interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    pub prev_rotation: f32,
    pub _pad: f32,
}

/// Physics component: velocity, rotational velocity, and material properties.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Physics {
    pub vx: f32,
    pub vy: f32,
    pub v_rotation: f32,
    pub mass: f32,
    pub radius: f32,
    pub restitution: f32,
    pub friction: f32,
    pub _pad: f32,
}

/// Stats component: health, score, and the colour-match progress used by
/// [`crate`]'s ring gating (see `jelly-sim`'s `RingSystem`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub hp: f32,
    pub max_hp: f32,
    pub score: f32,
    pub match_percent: f32,
    pub defense: f32,
    pub damage_mult: f32,
    /// Seconds remaining on a ring-commit shield grant; 0 when none is active.
    pub shield_timer: f32,
    pub _pad1: f32,
}

/// One-shot action bits consumed by `SkillSystem`.
pub const ACTION_PRIMARY: u32 = 1 << 0;
pub const ACTION_SECONDARY: u32 = 1 << 1;

/// Input component: the latest movement target and pending action bits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Input {
    pub target_x: f32,
    pub target_y: f32,
    /// Action bitmask, stored as a bit-pattern in an f32 slot so `Input`
    /// stays a uniform `[f32; 4]`-shaped row. Use [`Input::actions`] /
    /// [`Input::set_actions`] rather than reading the field directly.
    pub actions_bits: f32,
    pub _pad: f32,
}

impl Input {
    #[inline]
    pub fn actions(&self) -> u32 {
        self.actions_bits.to_bits()
    }

    #[inline]
    pub fn set_actions(&mut self, bits: u32) {
        self.actions_bits = f32::from_bits(bits);
    }
}

/// Per-entity movement tuning.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    pub max_speed: f32,
    pub speed_mult: f32,
    pub magnet_radius: f32,
    /// Seconds remaining on a ring-commit speed buff; 0 when none is active.
    pub buff_timer: f32,
}

/// Skill component: cooldown state for the entity's one active ability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Skill {
    pub cooldown: f32,
    pub max_cooldown: f32,
    pub active_timer: f32,
    pub shape_id: f32,
}

/// Pigment component: colour-mix domain used by the ring match logic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pigment {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub match_percent: f32,
}

// ---------------------------------------------------------------------------
// State flags
// ---------------------------------------------------------------------------

/// Bitmask flags stored per-entity in the `State` row. Bits 0-7 are reserved
/// for the engine; gameplay modules may use bit 8 and above.
pub mod flags {
    pub const ACTIVE: u16 = 1 << 0;
    pub const PLAYER: u16 = 1 << 1;
    pub const BOT: u16 = 1 << 2;
    pub const FOOD: u16 = 1 << 3;
    pub const PROJECTILE: u16 = 1 << 4;
    pub const DEAD: u16 = 1 << 5;
    pub const OBSTACLE: u16 = 1 << 6;
    pub const BOSS: u16 = 1 << 7;

    /// First bit index available to game-specific flags (food subtypes,
    /// faction tags, and so on).
    pub const GAME_FLAGS_START: u16 = 8;
}

/// Which ring (of the three concentric arena bands) an entity currently
/// occupies, and whether it has committed to crossing further inward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ring {
    #[default]
    Outer,
    Mid,
    Inner,
}

impl Ring {
    #[inline]
    pub fn as_u8(self) -> u8 {
        match self {
            Ring::Outer => 1,
            Ring::Mid => 2,
            Ring::Inner => 3,
        }
    }
}

/// Component-mask bits for the [`crate::dirty::DirtyTracker`], one per
/// component row that can independently change and needs re-encoding.
pub mod dirty_mask {
    pub const TRANSFORM: u32 = 1 << 0;
    pub const PHYSICS: u32 = 1 << 1;
    pub const STATS: u32 = 1 << 2;
    pub const STATE: u32 = 1 << 3;
    pub const SKILLS: u32 = 1 << 4;
    pub const PIGMENT: u32 = 1 << 5;
    pub const CUSTOM: u32 = 1 << 6;

    pub const ALL: u32 =
        TRANSFORM | PHYSICS | STATS | STATE | SKILLS | PIGMENT | CUSTOM;
}
