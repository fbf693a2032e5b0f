//! Canonical SSZ serialization.
//!
//! Composite values are laid out as a fixed section followed by a variable section. Fixed
//! size fields are written inline; variable size fields are replaced in the fixed section by
//! a 4-byte little-endian offset into the value. A stable container prefixes its active
//! fields bitvector and then encodes only its active fields.

use std::ops::Range;

use alloy_primitives::{Bytes, U256};

use super::{ActiveFields, MalformedEncoding, Schema, SchemaViolation, SszError, StableValue, Value};
use crate::constants::merkle::BYTES_PER_LENGTH_OFFSET;

/// Serializes `value` under `schema`.
pub fn serialize(schema: &Schema, value: &Value) -> Result<Vec<u8>, SszError> {
    let mut out = Vec::new();
    write(schema, value, &mut out)?;
    Ok(out)
}

/// Deserializes a value of `schema`. All of `bytes` must be consumed.
pub fn deserialize(schema: &Schema, bytes: &[u8]) -> Result<Value, SszError> {
    read(schema, bytes)
}

/// Appends the encoding of a `boolean` or `uintN`.
pub(crate) fn write_basic(schema: &Schema, value: &Value, out: &mut Vec<u8>) -> Result<(), SszError> {
    match (schema, value) {
        (Schema::Boolean, Value::Bool(value)) => out.push(u8::from(*value)),
        (Schema::Uint(bits), Value::Uint(value)) => {
            if value.bit_len() > *bits {
                return Err(SchemaViolation::UintOverflow { bits: *bits }.into());
            }
            out.extend_from_slice(&value.to_le_bytes::<32>()[..bits / 8]);
        }
        (schema, _) => return Err(SchemaViolation::TypeMismatch { expected: schema.kind() }.into()),
    }
    Ok(())
}

fn write(schema: &Schema, value: &Value, out: &mut Vec<u8>) -> Result<(), SszError> {
    match (schema, value) {
        (Schema::Boolean | Schema::Uint(_), _) => write_basic(schema, value, out),
        (Schema::ByteVector(length), Value::Bytes(bytes)) => {
            if bytes.len() != *length {
                return Err(
                    SchemaViolation::LengthMismatch { expected: *length, actual: bytes.len() }.into()
                );
            }
            out.extend_from_slice(bytes);
            Ok(())
        }
        (Schema::ByteList(limit), Value::Bytes(bytes)) => {
            if bytes.len() > *limit {
                return Err(SchemaViolation::LengthExceeded { limit: *limit, actual: bytes.len() }.into());
            }
            out.extend_from_slice(bytes);
            Ok(())
        }
        (Schema::Vector(element, length), Value::List(items)) => {
            if items.len() != *length {
                return Err(
                    SchemaViolation::LengthMismatch { expected: *length, actual: items.len() }.into()
                );
            }
            let parts: Vec<_> = items.iter().map(|item| (element.as_ref(), item)).collect();
            write_sequence(&parts, out)
        }
        (Schema::List(element, limit), Value::List(items)) => {
            if items.len() > *limit {
                return Err(SchemaViolation::LengthExceeded { limit: *limit, actual: items.len() }.into());
            }
            let parts: Vec<_> = items.iter().map(|item| (element.as_ref(), item)).collect();
            write_sequence(&parts, out)
        }
        (Schema::Container(fields), Value::Container(values)) => {
            if fields.len() != values.len() {
                return Err(
                    SchemaViolation::FieldCount { expected: fields.len(), actual: values.len() }.into()
                );
            }
            let parts: Vec<_> = fields.iter().map(|field| &field.schema).zip(values).collect();
            write_sequence(&parts, out)
        }
        (Schema::StableContainer(schema), Value::Stable(value)) => {
            schema.check_shape(value)?;
            out.extend_from_slice(value.active_fields().as_bytes());
            let parts = value
                .iter()
                .map(|(slot, field)| {
                    schema
                        .value_schema(slot)
                        .map(|schema| (schema, field))
                        .ok_or(SchemaViolation::UndefinedField(slot))
                })
                .collect::<Result<Vec<_>, _>>()?;
            write_sequence(&parts, out)
        }
        (Schema::Optional(_), _) => Err(SchemaViolation::MisplacedOptional.into()),
        (schema, _) => Err(SchemaViolation::TypeMismatch { expected: schema.kind() }.into()),
    }
}

fn write_sequence(parts: &[(&Schema, &Value)], out: &mut Vec<u8>) -> Result<(), SszError> {
    let fixed_len: usize = parts
        .iter()
        .map(|(schema, _)| schema.fixed_size().unwrap_or(BYTES_PER_LENGTH_OFFSET))
        .sum();
    let mut fixed = Vec::with_capacity(fixed_len);
    let mut variable = Vec::new();
    for (schema, value) in parts {
        if schema.is_variable_size() {
            let offset = fixed_len + variable.len();
            let offset = u32::try_from(offset)
                .map_err(|_| SchemaViolation::LengthExceeded { limit: u32::MAX as usize, actual: offset })?;
            fixed.extend_from_slice(&offset.to_le_bytes());
            write(schema, value, &mut variable)?;
        } else {
            write(schema, value, &mut fixed)?;
        }
    }
    out.extend_from_slice(&fixed);
    out.extend_from_slice(&variable);
    Ok(())
}

fn read(schema: &Schema, bytes: &[u8]) -> Result<Value, SszError> {
    match schema {
        Schema::Boolean => match exact(bytes, 1)?[0] {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(MalformedEncoding::InvalidBoolean(other).into()),
        },
        Schema::Uint(bits) => Ok(Value::Uint(U256::from_le_slice(exact(bytes, bits / 8)?))),
        Schema::ByteVector(length) => Ok(Value::Bytes(Bytes::copy_from_slice(exact(bytes, *length)?))),
        Schema::ByteList(limit) => {
            if bytes.len() > *limit {
                return Err(MalformedEncoding::LengthExceeded { limit: *limit, actual: bytes.len() }.into());
            }
            Ok(Value::Bytes(Bytes::copy_from_slice(bytes)))
        }
        Schema::Vector(element, length) => {
            if let Some(size) = element.fixed_size() {
                exact(bytes, size * length)?;
            }
            Ok(Value::List(read_sequence(&vec![element.as_ref(); *length], bytes)?))
        }
        Schema::List(element, limit) => {
            let count = list_length(element, bytes)?;
            if count > *limit {
                return Err(MalformedEncoding::LengthExceeded { limit: *limit, actual: count }.into());
            }
            Ok(Value::List(read_sequence(&vec![element.as_ref(); count], bytes)?))
        }
        Schema::Container(fields) => {
            let schemas: Vec<_> = fields.iter().map(|field| &field.schema).collect();
            Ok(Value::Container(read_sequence(&schemas, bytes)?))
        }
        Schema::StableContainer(schema) => {
            let active = ActiveFields::from_bytes(schema.capacity(), bytes)?;
            let mut slots = Vec::with_capacity(active.count());
            for slot in active.iter() {
                let field_schema =
                    schema.value_schema(slot).ok_or(MalformedEncoding::UnknownActiveField(slot))?;
                slots.push((slot, field_schema));
            }
            if let Some(field) = schema
                .fields()
                .iter()
                .enumerate()
                .find(|(slot, _)| !active.get(*slot) && !schema.is_optional(*slot))
                .map(|(_, field)| field)
            {
                return Err(MalformedEncoding::MissingField(field.name).into());
            }
            let schemas: Vec<_> = slots.iter().map(|(_, schema)| *schema).collect();
            let values = read_sequence(&schemas, &bytes[schema.active_fields_len()..])?;
            let value = slots
                .iter()
                .zip(values)
                .fold(StableValue::new(schema.capacity()), |value, ((slot, _), field)| {
                    value.with(*slot, field)
                });
            Ok(Value::Stable(value))
        }
        Schema::Optional(_) => Err(SchemaViolation::MisplacedOptional.into()),
    }
}

/// Number of elements in an encoded list of `element`.
fn list_length(element: &Schema, bytes: &[u8]) -> Result<usize, SszError> {
    if let Some(size) = element.fixed_size() {
        if size == 0 {
            return Ok(0);
        }
        if bytes.len() % size != 0 {
            return Err(MalformedEncoding::NotAMultiple { actual: bytes.len(), element: size }.into());
        }
        return Ok(bytes.len() / size);
    }
    if bytes.is_empty() {
        return Ok(0);
    }
    let first = read_offset(bytes, 0)?;
    if first == 0 || first % BYTES_PER_LENGTH_OFFSET != 0 {
        return Err(
            MalformedEncoding::NotAMultiple { actual: first, element: BYTES_PER_LENGTH_OFFSET }.into()
        );
    }
    if first > bytes.len() {
        return Err(MalformedEncoding::OffsetOutOfRange { offset: first, previous: 0, end: bytes.len() }.into());
    }
    Ok(first / BYTES_PER_LENGTH_OFFSET)
}

fn read_sequence(schemas: &[&Schema], bytes: &[u8]) -> Result<Vec<Value>, SszError> {
    let fixed_len: usize = schemas
        .iter()
        .map(|schema| schema.fixed_size().unwrap_or(BYTES_PER_LENGTH_OFFSET))
        .sum();
    if bytes.len() < fixed_len {
        return Err(MalformedEncoding::Truncated { expected: fixed_len, actual: bytes.len() }.into());
    }

    let mut spans: Vec<Range<usize>> = Vec::with_capacity(schemas.len());
    let mut offsets = Vec::new();
    let mut position = 0;
    for (index, schema) in schemas.iter().enumerate() {
        match schema.fixed_size() {
            Some(size) => {
                spans.push(position..position + size);
                position += size;
            }
            None => {
                offsets.push((index, read_offset(bytes, position)?));
                spans.push(0..0);
                position += BYTES_PER_LENGTH_OFFSET;
            }
        }
    }

    match offsets.first() {
        None if bytes.len() != fixed_len => {
            return Err(MalformedEncoding::TrailingBytes(bytes.len() - fixed_len).into());
        }
        Some((_, first)) if *first != fixed_len => {
            return Err(MalformedEncoding::InvalidFirstOffset { offset: *first, expected: fixed_len }.into());
        }
        _ => {}
    }
    for (position, (index, start)) in offsets.iter().enumerate() {
        let end = offsets.get(position + 1).map_or(bytes.len(), |(_, next)| *next);
        if end < *start || end > bytes.len() {
            return Err(
                MalformedEncoding::OffsetOutOfRange { offset: end, previous: *start, end: bytes.len() }.into()
            );
        }
        spans[*index] = *start..end;
    }

    schemas.iter().zip(spans).map(|(schema, span)| read(schema, &bytes[span])).collect()
}

fn read_offset(bytes: &[u8], position: usize) -> Result<usize, SszError> {
    let end = position + BYTES_PER_LENGTH_OFFSET;
    let raw = bytes
        .get(position..end)
        .ok_or(MalformedEncoding::Truncated { expected: end, actual: bytes.len() })?;
    let mut offset = [0u8; BYTES_PER_LENGTH_OFFSET];
    offset.copy_from_slice(raw);
    Ok(u32::from_le_bytes(offset) as usize)
}

fn exact(bytes: &[u8], length: usize) -> Result<&[u8], SszError> {
    match bytes.len() {
        actual if actual < length => Err(MalformedEncoding::Truncated { expected: length, actual }.into()),
        actual if actual > length => Err(MalformedEncoding::TrailingBytes(actual - length).into()),
        _ => Ok(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssz::{field, StableSchema};
    use alloy_primitives::hex;

    fn sample_stable() -> Schema {
        Schema::stable_container(
            4,
            vec![
                field("a", Schema::UINT64),
                field("b", Schema::optional(Schema::ByteList(8))),
                field("c", Schema::optional(Schema::Boolean)),
            ],
        )
    }

    #[test]
    fn test_stable_container_layout() {
        let value = Value::Stable(
            StableValue::new(4).with(0, Value::uint(1u64)).with(1, Value::bytes(vec![0xab, 0xcd])),
        );
        let encoded = serialize(&sample_stable(), &value).unwrap();
        // bitvector, uint64, offset 12, payload
        assert_eq!(encoded, hex!("03" "0100000000000000" "0c000000" "abcd"));
        assert_eq!(deserialize(&sample_stable(), &encoded).unwrap(), value);
    }

    #[test]
    fn test_container_with_list_of_containers() {
        let inner = Schema::Container(vec![
            field("address", Schema::ByteVector(2)),
            field("keys", Schema::list(Schema::BYTES32, 4)),
        ]);
        let schema = Schema::list(inner, 4);
        let value = Value::List(vec![
            Value::Container(vec![
                Value::bytes(vec![1, 2]),
                Value::List(vec![Value::Bytes(Bytes::from(vec![9; 32]))]),
            ]),
            Value::Container(vec![Value::bytes(vec![3, 4]), Value::List(vec![])]),
        ]);
        let encoded = serialize(&schema, &value).unwrap();
        assert_eq!(deserialize(&schema, &encoded).unwrap(), value);
        assert_eq!(deserialize(&schema, &[]).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_rejects_malformed() {
        let schema = sample_stable();
        // missing required field `a`
        assert_eq!(
            deserialize(&schema, &hex!("02" "00000000")),
            Err(MalformedEncoding::MissingField("a").into())
        );
        // bit 3 is within capacity but undefined
        assert_eq!(
            deserialize(&schema, &hex!("09" "0100000000000000")),
            Err(MalformedEncoding::UnknownActiveField(3).into())
        );
        // bit 4 is past capacity
        assert_eq!(
            deserialize(&schema, &hex!("11" "0100000000000000")),
            Err(MalformedEncoding::UnknownActiveField(4).into())
        );
        // trailing byte after a fixed-size body
        assert_eq!(
            deserialize(&schema, &hex!("01" "0100000000000000" "ff")),
            Err(MalformedEncoding::TrailingBytes(1).into())
        );
        // first offset does not point past the fixed section
        assert_eq!(
            deserialize(&schema, &hex!("03" "0100000000000000" "0d000000" "ab")),
            Err(MalformedEncoding::InvalidFirstOffset { offset: 13, expected: 12 }.into())
        );
        // boolean other than 0 or 1
        assert_eq!(
            deserialize(&schema, &hex!("05" "0100000000000000" "02")),
            Err(MalformedEncoding::InvalidBoolean(2).into())
        );
        // truncated uint64
        assert_eq!(
            deserialize(&schema, &hex!("01" "01000000")),
            Err(MalformedEncoding::Truncated { expected: 8, actual: 4 }.into())
        );
        // byte list above its limit
        assert_eq!(
            deserialize(&schema, &hex!("03" "0100000000000000" "0c000000" "000102030405060708")),
            Err(MalformedEncoding::LengthExceeded { limit: 8, actual: 9 }.into())
        );
    }

    #[test]
    fn test_rejects_bad_offsets() {
        let schema = Schema::list(Schema::ByteList(4), 4);
        // offsets 8 then 6: decreasing
        assert!(matches!(
            deserialize(&schema, &hex!("08000000" "06000000" "aabb")),
            Err(SszError::MalformedEncoding(MalformedEncoding::OffsetOutOfRange { .. }))
        ));
        // first offset not a multiple of 4
        assert_eq!(
            deserialize(&schema, &hex!("05000000" "aa")),
            Err(MalformedEncoding::NotAMultiple { actual: 5, element: 4 }.into())
        );
        // offset past the end
        assert!(matches!(
            deserialize(&schema, &hex!("08000000" "10000000")),
            Err(SszError::MalformedEncoding(MalformedEncoding::OffsetOutOfRange { .. }))
        ));
        // packed uint64 list with a partial element
        assert_eq!(
            deserialize(&Schema::list(Schema::UINT64, 4), &[0; 12]),
            Err(MalformedEncoding::NotAMultiple { actual: 12, element: 8 }.into())
        );
    }

    #[test]
    fn test_serialize_checks_shape() {
        let schema = StableSchema::new(4, vec![field("a", Schema::UINT64)]);
        let value = Value::Stable(StableValue::new(4).with(2, Value::uint(1u64)));
        assert_eq!(
            serialize(&Schema::StableContainer(schema), &value),
            Err(SchemaViolation::UndefinedField(2).into())
        );
        assert_eq!(
            serialize(&Schema::ByteVector(2), &Value::bytes(vec![1u8])),
            Err(SchemaViolation::LengthMismatch { expected: 2, actual: 1 }.into())
        );
    }
}
