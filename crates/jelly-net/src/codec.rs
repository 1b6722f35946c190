//! The binary wire format: explicit little-endian tag/length/field byte
//! layout, not a general-purpose serialization format. The layout is part
//! of the client/server contract, so it is hand-written rather than
//! delegated to a schema-evolving codec.

use crate::CodecError;

pub const TAG_TRANSFORM_UPDATE: u8 = 0x01;
pub const TAG_PHYSICS_UPDATE: u8 = 0x02;
pub const TAG_COMPONENT_DELTA: u8 = 0x03;
pub const TAG_ENTITY_SPAWN: u8 = 0x04;
pub const TAG_ENTITY_DESTROY: u8 = 0x05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformEntry {
    pub id: u16,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsEntry {
    pub id: u16,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDeltaEntry {
    pub id: u16,
    /// Field values in the schema order agreed for `component_id`.
    pub fields: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    TransformUpdate {
        timestamp: f32,
        entries: Vec<TransformEntry>,
    },
    PhysicsUpdate {
        timestamp: f32,
        entries: Vec<PhysicsEntry>,
    },
    ComponentDelta {
        timestamp: f32,
        component_id: String,
        entries: Vec<ComponentDeltaEntry>,
    },
    EntitySpawn {
        id: u16,
        template: String,
    },
    EntityDestroy {
        id: u16,
    },
}

/// Append `packet`'s wire encoding to `buf`.
pub fn encode(packet: &Packet, buf: &mut Vec<u8>) {
    match packet {
        Packet::TransformUpdate { timestamp, entries } => {
            buf.push(TAG_TRANSFORM_UPDATE);
            buf.extend_from_slice(&timestamp.to_le_bytes());
            buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
            for e in entries {
                buf.extend_from_slice(&e.id.to_le_bytes());
                buf.extend_from_slice(&e.x.to_le_bytes());
                buf.extend_from_slice(&e.y.to_le_bytes());
            }
        }
        Packet::PhysicsUpdate { timestamp, entries } => {
            buf.push(TAG_PHYSICS_UPDATE);
            buf.extend_from_slice(&timestamp.to_le_bytes());
            buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
            for e in entries {
                buf.extend_from_slice(&e.id.to_le_bytes());
                buf.extend_from_slice(&e.vx.to_le_bytes());
                buf.extend_from_slice(&e.vy.to_le_bytes());
                buf.extend_from_slice(&e.radius.to_le_bytes());
            }
        }
        Packet::ComponentDelta {
            timestamp,
            component_id,
            entries,
        } => {
            buf.push(TAG_COMPONENT_DELTA);
            buf.extend_from_slice(&timestamp.to_le_bytes());
            let id_bytes = component_id.as_bytes();
            buf.push(id_bytes.len() as u8);
            buf.extend_from_slice(id_bytes);
            buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
            for e in entries {
                buf.extend_from_slice(&e.id.to_le_bytes());
                for field in &e.fields {
                    buf.extend_from_slice(&field.to_le_bytes());
                }
            }
        }
        Packet::EntitySpawn { id, template } => {
            buf.push(TAG_ENTITY_SPAWN);
            buf.extend_from_slice(&id.to_le_bytes());
            let tmpl_bytes = template.as_bytes();
            buf.push(tmpl_bytes.len() as u8);
            buf.extend_from_slice(tmpl_bytes);
        }
        Packet::EntityDestroy { id } => {
            buf.push(TAG_ENTITY_DESTROY);
            buf.extend_from_slice(&id.to_le_bytes());
        }
    }
}

/// Decode one packet from the front of `data`. `component_delta_fields`
/// tells the decoder how many `f32` fields each entry of a `COMPONENT_DELTA`
/// packet carries, since the wire format itself only names the component.
pub fn decode(data: &[u8], component_delta_fields: usize) -> Result<Packet, CodecError> {
    let mut cur = Cursor::new(data);
    let tag = cur.take_u8()?;
    match tag {
        TAG_TRANSFORM_UPDATE => {
            let timestamp = cur.take_f32()?;
            let count = cur.take_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let id = cur.take_u16()?;
                let x = cur.take_f32()?;
                let y = cur.take_f32()?;
                entries.push(TransformEntry { id, x, y });
            }
            Ok(Packet::TransformUpdate { timestamp, entries })
        }
        TAG_PHYSICS_UPDATE => {
            let timestamp = cur.take_f32()?;
            let count = cur.take_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let id = cur.take_u16()?;
                let vx = cur.take_f32()?;
                let vy = cur.take_f32()?;
                let radius = cur.take_f32()?;
                entries.push(PhysicsEntry { id, vx, vy, radius });
            }
            Ok(Packet::PhysicsUpdate { timestamp, entries })
        }
        TAG_COMPONENT_DELTA => {
            let timestamp = cur.take_f32()?;
            let id_len = cur.take_u8()? as usize;
            let component_id = cur.take_utf8(id_len)?;
            let count = cur.take_u16()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let id = cur.take_u16()?;
                let mut fields = Vec::with_capacity(component_delta_fields);
                for _ in 0..component_delta_fields {
                    fields.push(cur.take_f32()?);
                }
                entries.push(ComponentDeltaEntry { id, fields });
            }
            Ok(Packet::ComponentDelta {
                timestamp,
                component_id,
                entries,
            })
        }
        TAG_ENTITY_SPAWN => {
            let id = cur.take_u16()?;
            let tmpl_len = cur.take_u8()? as usize;
            let template = cur.take_utf8(tmpl_len)?;
            Ok(Packet::EntitySpawn { id, template })
        }
        TAG_ENTITY_DESTROY => {
            let id = cur.take_u16()?;
            Ok(Packet::EntityDestroy { id })
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.data.len() {
            return Err(CodecError::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn take_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_utf8(&mut self, n: usize) -> Result<String, CodecError> {
        let bytes = self.take(n)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_update_round_trips() {
        let packet = Packet::TransformUpdate {
            timestamp: 1.5,
            entries: vec![
                TransformEntry { id: 3, x: 1.0, y: -2.0 },
                TransformEntry { id: 9, x: 0.0, y: 100.25 },
            ],
        };
        let mut buf = Vec::new();
        encode(&packet, &mut buf);
        let decoded = decode(&buf, 0).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn component_delta_round_trips_with_schema_field_count() {
        let packet = Packet::ComponentDelta {
            timestamp: 4.0,
            component_id: "stats".to_string(),
            entries: vec![ComponentDeltaEntry {
                id: 1,
                fields: vec![100.0, 100.0, 0.0, 0.0],
            }],
        };
        let mut buf = Vec::new();
        encode(&packet, &mut buf);
        let decoded = decode(&buf, 4).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn truncated_buffer_is_rejected_not_panicking() {
        let packet = Packet::EntityDestroy { id: 42 };
        let mut buf = Vec::new();
        encode(&packet, &mut buf);
        buf.pop();
        assert!(matches!(decode(&buf, 0), Err(CodecError::Truncated)));
    }

    #[test]
    fn spawn_then_destroy_on_fresh_cache_yields_empty_cache() {
        use std::collections::HashSet;
        let mut cache: HashSet<u16> = HashSet::new();

        let spawn = Packet::EntitySpawn {
            id: 7,
            template: "bot".to_string(),
        };
        let mut buf = Vec::new();
        encode(&spawn, &mut buf);
        if let Packet::EntitySpawn { id, .. } = decode(&buf, 0).unwrap() {
            cache.insert(id);
        }

        let destroy = Packet::EntityDestroy { id: 7 };
        buf.clear();
        encode(&destroy, &mut buf);
        if let Packet::EntityDestroy { id } = decode(&buf, 0).unwrap() {
            cache.remove(&id);
        }

        assert!(cache.is_empty());
    }
}
