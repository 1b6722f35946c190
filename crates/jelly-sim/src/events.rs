//! Fixed-size ring buffer of numerically-typed engine events, drained once
//! per tick by the transport bridge. Gameplay systems push onto it directly
//! rather than routing through a queued-message layer, so a ring commit or
//! a death is visible to the transport the same tick it happens.

use tracing::warn;

/// Event kinds the transport bridge understands. `None` is the buffer's
/// default/empty-slot value, never pushed by a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    None = 0,
    RingCommit = 1,
    EntityDeath = 2,
    EntitySpawn = 3,
    SkillFired = 4,
    FloatingText = 5,
    GameStart = 6,
    GameOver = 7,
}

/// One engine event: a kind plus the entity slot it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineEvent {
    pub kind: EventKind,
    pub entity: u16,
}

impl EngineEvent {
    pub fn new(kind: EventKind, entity: u16) -> Self {
        Self { kind, entity }
    }
}

/// A bounded FIFO of `EngineEvent`s. Once full, further pushes are dropped
/// and counted; the drop count is logged once per overflow episode rather
/// than once per dropped event, so a burst doesn't flood the log.
#[derive(Debug)]
pub struct EventRing {
    buf: Vec<EngineEvent>,
    capacity: usize,
    overflowed: bool,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            overflowed: false,
        }
    }

    pub fn push(&mut self, event: EngineEvent) {
        if self.buf.len() >= self.capacity {
            if !self.overflowed {
                warn!(capacity = self.capacity, "engine event ring overflowed, dropping events");
                self.overflowed = true;
            }
            return;
        }
        self.buf.push(event);
    }

    /// Drain all buffered events and reset the overflow flag for the next tick.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.overflowed = false;
        std::mem::take(&mut self.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
