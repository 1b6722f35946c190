//! Per-tick snapshot encoding: delta frames by default, a forced full
//! snapshot every `SNAPSHOT_INTERVAL` ticks so a client that missed a delta
//! (dropped frame, late join) resyncs without a special-case message.

use jelly_ecs::components::{dirty_mask, Transform};
use jelly_ecs::dirty::DirtyTracker;
use jelly_ecs::world::World;

use crate::codec::{encode, Packet, TransformEntry};

const POOL_BUFFER_SIZE: usize = 128 * 1024;
const POOL_BUFFERS: usize = 4;

/// A small pool of preallocated buffers checked out per encode; exhausting
/// the pool falls back to a one-off heap allocation rather than blocking.
#[derive(Debug)]
struct BufferPool {
    free: Vec<Vec<u8>>,
}

impl BufferPool {
    fn new() -> Self {
        Self {
            free: (0..POOL_BUFFERS)
                .map(|_| Vec::with_capacity(POOL_BUFFER_SIZE))
                .collect(),
        }
    }

    fn checkout(&mut self) -> Vec<u8> {
        self.free
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(POOL_BUFFER_SIZE))
    }

    fn release(&mut self, mut buf: Vec<u8>) {
        if self.free.len() < POOL_BUFFERS {
            buf.clear();
            self.free.push(buf);
        }
    }
}

/// Produces one `TRANSFORM_UPDATE` wire frame per tick: a delta of dirty
/// entities, or a full snapshot of every active entity every
/// `snapshot_interval` ticks.
#[derive(Debug)]
pub struct SnapshotEncoder {
    pool: BufferPool,
    frames_since_snapshot: u32,
    snapshot_interval: u32,
}

impl SnapshotEncoder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            pool: BufferPool::new(),
            frames_since_snapshot: 0,
            snapshot_interval,
        }
    }

    /// Encode this tick's frame body (without the `lastProcessedInputSeq`
    /// prefix, which the caller prepends per-client).
    pub fn encode_tick(&mut self, world: &World, dirty: &DirtyTracker, sim_time: f32) -> Vec<u8> {
        self.frames_since_snapshot += 1;
        let force_full = self.frames_since_snapshot >= self.snapshot_interval;

        let ids: Vec<u16> = if force_full {
            self.frames_since_snapshot = 0;
            world.active_iter().collect()
        } else {
            dirty.dirty_entities(Some(dirty_mask::TRANSFORM))
        };

        let entries: Vec<TransformEntry> = ids
            .into_iter()
            .map(|id| {
                let Transform { x, y, .. } = *world.transform(id);
                TransformEntry { id, x, y }
            })
            .collect();

        let packet = Packet::TransformUpdate {
            timestamp: sim_time,
            entries,
        };

        let mut buf = self.pool.checkout();
        encode(&packet, &mut buf);
        buf
    }

    /// Return a buffer to the pool once the caller is done sending it.
    pub fn release(&mut self, buf: Vec<u8>) {
        self.pool.release(buf);
    }

    pub fn is_full_snapshot_due(&self) -> bool {
        self.frames_since_snapshot == 0
    }
}

/// Prefix a per-client frame body with the last input sequence the Room
/// processed from that client, for unicast framing.
pub fn frame_with_ack(last_processed_input_seq: u32, body: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&last_processed_input_seq.to_le_bytes());
    framed.extend_from_slice(body);
    framed
}

#[cfg(test)]
mod tests {
    use super::*;
    use jelly_ecs::prelude::*;

    fn spawn_dirty(world: &mut World, dirty: &mut DirtyTracker, x: f32) -> u16 {
        let handle = world.allocate().unwrap();
        let idx = world.index_of(handle).unwrap();
        world.transform_mut(idx).x = x;
        world.activate(idx);
        dirty.mark_dirty(idx, dirty_mask::TRANSFORM);
        idx
    }

    #[test]
    fn full_snapshot_fires_every_interval_ticks() {
        let mut world = World::new(8);
        let mut dirty = DirtyTracker::new();
        spawn_dirty(&mut world, &mut dirty, 1.0);
        spawn_dirty(&mut world, &mut dirty, 2.0);

        let mut encoder = SnapshotEncoder::new(60);
        let mut full_count = 0;
        for tick in 1..=120u32 {
            let _buf = encoder.encode_tick(&world, &dirty, tick as f32 / 60.0);
            if encoder.is_full_snapshot_due() {
                full_count += 1;
            }
            dirty.clear_all();
        }
        assert_eq!(full_count, 2);
    }

    #[test]
    fn ack_prefix_is_four_bytes_little_endian() {
        let framed = frame_with_ack(0x0102_0304, &[0xAA]);
        assert_eq!(&framed[0..4], &0x0102_0304u32.to_le_bytes());
        assert_eq!(framed[4], 0xAA);
    }
}
