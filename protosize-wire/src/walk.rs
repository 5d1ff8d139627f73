// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::schema::{FieldKind, MessageSchema, SchemaIndex};
use protosize::api::SampleSet;
use tracing::debug;

/// Messages nested deeper than this are rejected rather than walked. Real
/// schemas stay in the tens; anything past this is a malicious or corrupt
/// payload trying to exhaust the stack.
pub const MAX_RECURSION_DEPTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },
    #[error("varint at offset {offset} exceeds 10 bytes")]
    MalformedVarint { offset: usize },
    #[error("truncated field at offset {offset}: need {needed} bytes, have {available}")]
    TruncatedField {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("unsupported group wire type for field {field_number} at offset {offset}")]
    UnsupportedGroup { field_number: i32, offset: usize },
    #[error("invalid wire type {wire_type} at offset {offset}")]
    InvalidWireType { wire_type: u8, offset: usize },
    #[error("message nesting exceeds {MAX_RECURSION_DEPTH} levels")]
    DepthLimit,
}

/// Walks `bytes` as one serialized message of the `root` type and returns
/// the byte size of every field occurrence, keyed by field path.
///
/// One occurrence's size is its full encoded footprint: tag bytes, length
/// prefix when present, and payload. A message-typed occurrence is recorded
/// at its own path and then decomposed field by field, so occurrences
/// appear at every nesting depth and the root's immediate fields sum to
/// the input length (less any fields the schema does not know about).
///
/// A packed repeated scalar field is one wire record and counts as one
/// occurrence. Fields absent from the schema are skipped, their bytes
/// still consumed.
pub fn compute_size_profile(
    bytes: &[u8],
    root: &MessageSchema,
    schema: &SchemaIndex,
) -> Result<SampleSet, WalkError> {
    let mut walker = Walker {
        schema,
        samples: SampleSet::default(),
        path: Vec::new(),
    };
    walker.walk_message(bytes, 0, root, 0)?;
    Ok(walker.samples)
}

struct Walker<'a> {
    schema: &'a SchemaIndex,
    samples: SampleSet,
    /// Field names from the root to the message currently being walked;
    /// cloned into the sample set once per occurrence.
    path: Vec<String>,
}

impl<'a> Walker<'a> {
    fn walk_message(
        &mut self,
        buf: &[u8],
        base: usize,
        message: &MessageSchema,
        depth: usize,
    ) -> Result<(), WalkError> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(WalkError::DepthLimit);
        }

        let mut pos = 0;
        while pos < buf.len() {
            let field_start = pos;
            let key = read_varint(buf, base, &mut pos)?;
            // Field numbers above 2^29 - 1 can't come from a descriptor;
            // -1 never matches one, so such records fall through as unknown.
            let field_number = i32::try_from(key >> 3).unwrap_or(-1);
            let wire_type = (key & 0b111) as u8;

            // Bounds of a length-delimited payload, for descending into it.
            let mut delimited: Option<(usize, usize)> = None;
            match wire_type {
                0 => {
                    read_varint(buf, base, &mut pos)?;
                }
                1 => take(buf, base, &mut pos, 8)?,
                5 => take(buf, base, &mut pos, 4)?,
                2 => {
                    let length = read_varint(buf, base, &mut pos)?;
                    let length = usize::try_from(length).unwrap_or(usize::MAX);
                    let payload_offset = pos;
                    take(buf, base, &mut pos, length)?;
                    delimited = Some((payload_offset, length));
                }
                3 | 4 => {
                    return Err(WalkError::UnsupportedGroup {
                        field_number,
                        offset: base + field_start,
                    })
                }
                _ => {
                    return Err(WalkError::InvalidWireType {
                        wire_type,
                        offset: base + field_start,
                    })
                }
            }
            let size = (pos - field_start) as u64;

            let Some(field) = message.field(field_number) else {
                debug!(
                    field_number,
                    offset = base + field_start,
                    message_type = message.full_name(),
                    "skipping field not present in the schema"
                );
                continue;
            };

            self.path.push(field.name.clone());
            self.samples
                .entry(self.path.clone())
                .or_default()
                .push(size);

            if let (Some((offset, length)), FieldKind::Message(type_name)) =
                (delimited, &field.kind)
            {
                // Detach from &mut self; the nested schema lives as long
                // as the index, not as long as this borrow.
                let schema = self.schema;
                match schema.message(type_name) {
                    Some(nested) => {
                        self.walk_message(
                            &buf[offset..offset + length],
                            base + offset,
                            nested,
                            depth + 1,
                        )?;
                    }
                    None => debug!(
                        %type_name,
                        field = field.name.as_str(),
                        "field references a message type missing from the descriptor set"
                    ),
                }
            }
            self.path.pop();
        }
        Ok(())
    }
}

fn read_varint(buf: &[u8], base: usize, pos: &mut usize) -> Result<u64, WalkError> {
    let start = *pos;
    let mut value = 0u64;
    for i in 0..10 {
        let Some(&byte) = buf.get(*pos) else {
            return Err(WalkError::TruncatedVarint {
                offset: base + start,
            });
        };
        *pos += 1;
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(WalkError::MalformedVarint {
        offset: base + start,
    })
}

fn take(buf: &[u8], base: usize, pos: &mut usize, needed: usize) -> Result<(), WalkError> {
    let available = buf.len() - *pos;
    if needed > available {
        return Err(WalkError::TruncatedField {
            offset: base + *pos,
            needed,
            available,
        });
    }
    *pos += needed;
    Ok(())
}
