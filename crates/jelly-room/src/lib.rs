//! jelly-room -- the Room supervisor: session bookkeeping, the fixed-tick
//! accumulator loop, input ingestion, and wiring the `jelly-sim` systems and
//! the `jelly-net` snapshot encoder together into one authoritative match.

pub mod config;
pub mod input;
pub mod room;
pub mod session;

use jelly_ecs::EcsError;

/// Errors produced by `jelly-room` operations. Per the taxonomy these
/// concerns mirror, nothing here propagates across a tick boundary: a
/// `Room` always completes its tick, or skips only the offending
/// per-entity/per-session work and logs it.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("invalid level config: {0}")]
    InvalidConfig(String),
    #[error("invalid join options: {0}")]
    InvalidJoinOptions(String),
    #[error("entity pool exhausted, join refused")]
    PoolExhausted,
    #[error("room creation rate limit exceeded for this address")]
    CreationRateLimited,
    #[error("room is shutting down, no longer accepting joins")]
    ShuttingDown,
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

pub mod prelude {
    pub use crate::config::{LevelConfig, WinCondition};
    pub use crate::input::ValidatedInput;
    pub use crate::room::{JoinOptions, Room, RoomCreateLimiter, SessionId};
    pub use crate::session::Session;
    pub use crate::RoomError;
}
