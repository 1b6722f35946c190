//! Incoming `input` message parsing, validation, and the boundary
//! conversion from the boolean wire form to the internal action bitmask.

use jelly_ecs::components::{ACTION_PRIMARY, ACTION_SECONDARY};
use serde::Deserialize;

/// Either wire shape is accepted; both are converted to the bitmask form on
/// ingest so everything past this module deals with one representation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInput {
    Bitmask {
        seq: u32,
        #[serde(rename = "targetX")]
        target_x: f32,
        #[serde(rename = "targetY")]
        target_y: f32,
        actions: u32,
    },
    Booleans {
        seq: u32,
        #[serde(rename = "targetX")]
        target_x: f32,
        #[serde(rename = "targetY")]
        target_y: f32,
        space: bool,
        w: bool,
    },
}

/// A validated, bitmask-normalized input ready to be written into a
/// session's pending-input slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedInput {
    pub seq: u32,
    pub target_x: f32,
    pub target_y: f32,
    pub actions: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("message exceeds the {0}-byte size cap")]
    TooLarge(usize),
    #[error("message could not be parsed: {0}")]
    Malformed(String),
    #[error("target coordinates out of range")]
    OutOfRange,
}

/// Parse, size-check, shape-check, and bounds-check a raw `input` message.
/// Coordinates outside `[-map_radius, map_radius]` are rejected rather than
/// clamped here; the Room clamps separately on ingest per its own policy.
pub fn parse_and_validate(
    bytes: &[u8],
    max_message_size: usize,
    map_radius: f32,
) -> Result<ValidatedInput, InputError> {
    if bytes.len() > max_message_size {
        return Err(InputError::TooLarge(max_message_size));
    }

    let raw: RawInput =
        serde_json::from_slice(bytes).map_err(|e| InputError::Malformed(e.to_string()))?;

    let (seq, target_x, target_y, actions) = match raw {
        RawInput::Bitmask {
            seq,
            target_x,
            target_y,
            actions,
        } => (seq, target_x, target_y, actions),
        RawInput::Booleans {
            seq,
            target_x,
            target_y,
            space,
            w,
        } => {
            let mut actions = 0;
            if space {
                actions |= ACTION_PRIMARY;
            }
            if w {
                actions |= ACTION_SECONDARY;
            }
            (seq, target_x, target_y, actions)
        }
    };

    if !target_x.is_finite()
        || !target_y.is_finite()
        || target_x.abs() > map_radius
        || target_y.abs() > map_radius
    {
        return Err(InputError::OutOfRange);
    }

    Ok(ValidatedInput {
        seq,
        target_x,
        target_y,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_form_converts_to_bitmask() {
        let msg = br#"{"seq":1,"targetX":10.0,"targetY":-5.0,"space":true,"w":false}"#;
        let parsed = parse_and_validate(msg, 256, 1500.0).unwrap();
        assert_eq!(parsed.actions, ACTION_PRIMARY);
    }

    #[test]
    fn bitmask_form_passes_through() {
        let msg = br#"{"seq":1,"targetX":10.0,"targetY":-5.0,"actions":3}"#;
        let parsed = parse_and_validate(msg, 256, 1500.0).unwrap();
        assert_eq!(parsed.actions, 3);
    }

    #[test]
    fn oversized_message_rejected() {
        let msg = vec![b'a'; 300];
        assert!(matches!(
            parse_and_validate(&msg, 256, 1500.0),
            Err(InputError::TooLarge(256))
        ));
    }

    #[test]
    fn out_of_range_target_rejected() {
        let msg = br#"{"seq":1,"targetX":99999.0,"targetY":0.0,"actions":0}"#;
        assert!(matches!(
            parse_and_validate(msg, 256, 1500.0),
            Err(InputError::OutOfRange)
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        let msg = b"not json";
        assert!(matches!(
            parse_and_validate(msg, 256, 1500.0),
            Err(InputError::Malformed(_))
        ));
    }
}
