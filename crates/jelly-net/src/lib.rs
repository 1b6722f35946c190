//! jelly-net -- the binary wire protocol and snapshot encoder bridging a
//! room's `World` to its connected clients. No transport is implemented
//! here; this crate only encodes and decodes bytes.

pub mod codec;
pub mod snapshot;

/// Errors produced decoding a wire frame.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer truncated before all declared fields were read")]
    Truncated,
    #[error("unknown packet tag: {0:#04x}")]
    UnknownTag(u8),
    #[error("string field was not valid UTF-8")]
    InvalidUtf8,
}

pub mod prelude {
    pub use crate::codec::{
        decode, encode, ComponentDeltaEntry, Packet, PhysicsEntry, TransformEntry,
    };
    pub use crate::snapshot::{frame_with_ack, SnapshotEncoder};
    pub use crate::CodecError;
}
