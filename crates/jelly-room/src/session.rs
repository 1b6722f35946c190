//! Per-connection state the Room keeps outside the `World`: the pending
//! input slot, the stored entity handle, and rate-limiting bookkeeping.

use std::time::Instant;

use jelly_ecs::handle::EntityHandle;

use crate::input::ValidatedInput;

/// Classic token bucket: refills continuously at `refill_per_sec`, capped at
/// `capacity`; each accepted message costs one token. Wall-clock based,
/// since rate limiting governs message arrival rather than simulation state
/// and so does not need to be part of the deterministic tick.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f32,
    tokens: f32,
    refill_per_sec: f32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rate_per_sec: u32) -> Self {
        Self {
            capacity: rate_per_sec as f32,
            tokens: rate_per_sec as f32,
            refill_per_sec: rate_per_sec as f32,
            last_refill: Instant::now(),
        }
    }

    /// Refill based on elapsed wall-clock time, then try to consume one
    /// token. Returns `true` if the message is accepted.
    pub fn try_consume(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// A joined client's server-side state.
#[derive(Debug)]
pub struct Session {
    pub handle: EntityHandle,
    pub pending_input: Option<ValidatedInput>,
    pub last_processed_input: u32,
    /// Auxiliary entities (currently: fired projectiles) this session owns.
    /// Checked against `SimConstants::max_entities_per_client` before a new
    /// one is allowed to spawn.
    pub child_entity_count: u32,
    pub rate_bucket: TokenBucket,
}

impl Session {
    pub fn new(handle: EntityHandle, rate_limit_per_sec: u32) -> Self {
        Self {
            handle,
            pending_input: None,
            last_processed_input: 0,
            child_entity_count: 0,
            rate_bucket: TokenBucket::new(rate_limit_per_sec),
        }
    }

    /// Overwrite the pending input slot. Last-writer-wins: an older pending
    /// input is simply discarded, never queued.
    pub fn stage_input(&mut self, input: ValidatedInput) {
        self.pending_input = Some(input);
    }

    /// Take-and-clear the pending input for this tick.
    pub fn take_input(&mut self) -> Option<ValidatedInput> {
        self.pending_input.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn bucket_admits_up_to_capacity_then_rejects() {
        let mut bucket = TokenBucket::new(5);
        let mut accepted = 0;
        for _ in 0..10 {
            if bucket.try_consume() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 5);
    }

    #[test]
    fn bucket_refills_over_time() {
        let mut bucket = TokenBucket::new(10);
        for _ in 0..10 {
            assert!(bucket.try_consume());
        }
        assert!(!bucket.try_consume());
        sleep(Duration::from_millis(150));
        assert!(bucket.try_consume());
    }

    #[test]
    fn stage_then_take_is_last_writer_wins() {
        use crate::input::ValidatedInput;
        let handle = EntityHandle::new(0, 0);
        let mut session = Session::new(handle, 60);
        session.stage_input(ValidatedInput {
            seq: 1,
            target_x: 0.0,
            target_y: 0.0,
            actions: 0,
        });
        session.stage_input(ValidatedInput {
            seq: 2,
            target_x: 1.0,
            target_y: 1.0,
            actions: 0,
        });
        let taken = session.take_input().unwrap();
        assert_eq!(taken.seq, 2);
        assert!(session.take_input().is_none());
    }
}
