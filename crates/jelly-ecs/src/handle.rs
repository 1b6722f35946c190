//! Entity handles: a 32-bit composite of generation and slot index.
//!
//! A handle is the only identifier that may cross a suspension boundary (a
//! tick boundary, or the network). Raw slot indices are an implementation
//! detail of [`crate::world::World`] and are never exposed past the
//! allocator.

use std::fmt;

/// A generational entity handle.
///
/// Layout: `[generation: u16 | index: u16]`, packed into a `u32` as
/// `(generation << 16) | index`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// Build a handle from an index and generation.
    #[inline]
    pub fn new(index: u16, generation: u16) -> Self {
        Self(((generation as u32) << 16) | index as u32)
    }

    /// The slot index (low 16 bits).
    #[inline]
    pub fn index(self) -> u16 {
        self.0 as u16
    }

    /// The generation (high 16 bits).
    #[inline]
    pub fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Raw `u32` representation, suitable for wire encoding.
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Reconstruct a handle from its raw `u32` representation.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let h = EntityHandle::new(42, 7);
        assert_eq!(h.index(), 42);
        assert_eq!(h.generation(), 7);
        assert_eq!(EntityHandle::from_raw(h.to_raw()), h);
    }

    #[test]
    fn packs_as_documented() {
        let h = EntityHandle::new(0x00FF, 0x0001);
        assert_eq!(h.to_raw(), (0x0001u32 << 16) | 0x00FF);
    }
}
