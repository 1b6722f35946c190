//! Property tests for the wire codec: for any sequence of entries, encoding
//! then decoding must reproduce the original packet bit-for-bit, and
//! truncating an encoded buffer by any amount must be rejected rather than
//! panicking.
//!
//! Round-trips are compared via `to_bits()` rather than `==`/derived
//! `PartialEq`, since `any::<f32>()` can draw NaN and `NaN != NaN` would
//! make an exact-reproduction property spuriously fail on its own output.

use jelly_net::codec::{decode, encode, ComponentDeltaEntry, Packet, TransformEntry};
use proptest::prelude::*;

fn transform_entry() -> impl Strategy<Value = TransformEntry> {
    (any::<u16>(), any::<f32>(), any::<f32>()).prop_map(|(id, x, y)| TransformEntry { id, x, y })
}

fn transform_entries_match(a: &[TransformEntry], b: &[TransformEntry]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(a, b)| a.id == b.id && a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits())
}

proptest! {
    #[test]
    fn transform_update_round_trips_for_any_entry_set(
        timestamp in any::<f32>(),
        entries in prop::collection::vec(transform_entry(), 0..32),
    ) {
        let packet = Packet::TransformUpdate { timestamp, entries: entries.clone() };
        let mut buf = Vec::new();
        encode(&packet, &mut buf);
        match decode(&buf, 0).unwrap() {
            Packet::TransformUpdate { timestamp: got_ts, entries: got_entries } => {
                prop_assert_eq!(got_ts.to_bits(), timestamp.to_bits());
                prop_assert!(transform_entries_match(&got_entries, &entries));
            }
            other => prop_assert!(false, "decoded wrong packet variant: {other:?}"),
        }
    }

    #[test]
    fn component_delta_round_trips_for_any_field_width(
        timestamp in any::<f32>(),
        id in any::<u16>(),
        fields in prop::collection::vec(any::<f32>(), 0..8),
    ) {
        let field_count = fields.len();
        let packet = Packet::ComponentDelta {
            timestamp,
            component_id: "c".to_string(),
            entries: vec![ComponentDeltaEntry { id, fields: fields.clone() }],
        };
        let mut buf = Vec::new();
        encode(&packet, &mut buf);
        match decode(&buf, field_count).unwrap() {
            Packet::ComponentDelta { timestamp: got_ts, component_id, entries } => {
                prop_assert_eq!(got_ts.to_bits(), timestamp.to_bits());
                prop_assert_eq!(component_id, "c");
                prop_assert_eq!(entries.len(), 1);
                prop_assert_eq!(entries[0].id, id);
                let got_bits: Vec<u32> = entries[0].fields.iter().map(|f| f.to_bits()).collect();
                let want_bits: Vec<u32> = fields.iter().map(|f| f.to_bits()).collect();
                prop_assert_eq!(got_bits, want_bits);
            }
            other => prop_assert!(false, "decoded wrong packet variant: {other:?}"),
        }
    }

    #[test]
    fn truncated_at_any_length_never_panics(
        entries in prop::collection::vec(transform_entry(), 1..8),
        cut in 0usize..64,
    ) {
        let packet = Packet::TransformUpdate { timestamp: 0.0, entries };
        let mut buf = Vec::new();
        encode(&packet, &mut buf);
        let len = buf.len().saturating_sub(cut);
        let _ = decode(&buf[..len], 0);
    }
}
