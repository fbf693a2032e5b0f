//! Merkleization of SSZ values.
//!
//! Trees are padded virtually: missing right subtrees are filled with precomputed roots of
//! all-zero subtrees, so hashing a short list with a large limit only costs
//! `O(len * depth)` hash invocations.

use alloy_primitives::{B256, U256};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use tracing::trace;

use super::{codec, Schema, SchemaViolation, SszError, StableSchema, StableValue, Value};
use crate::constants::merkle::{BYTES_PER_CHUNK, MAX_TREE_DEPTH};

/// `ZERO_HASHES[d]` is the root of a tree of depth `d` whose leaves are all zero chunks.
static ZERO_HASHES: Lazy<Vec<B256>> = Lazy::new(|| {
    let mut hashes = Vec::with_capacity(MAX_TREE_DEPTH + 1);
    hashes.push(B256::ZERO);
    for depth in 0..MAX_TREE_DEPTH {
        let below = hashes[depth];
        hashes.push(hash_pair(&below, &below));
    }
    hashes
});

/// Returns the root of an all-zero tree of the given depth.
pub fn zero_hash(depth: usize) -> B256 {
    ZERO_HASHES[depth]
}

/// `sha256(left || right)`.
pub fn hash_pair(left: &B256, right: &B256) -> B256 {
    let digest = Sha256::new().chain_update(left).chain_update(right).finalize();
    B256::from_slice(&digest)
}

/// Splits `bytes` into 32-byte chunks, zero padding the last one.
pub fn pack(bytes: &[u8]) -> Vec<B256> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|chunk| {
            let mut padded = B256::ZERO;
            padded[..chunk.len()].copy_from_slice(chunk);
            padded
        })
        .collect()
}

/// Depth of the smallest tree with at least `leaves` leaves.
pub fn tree_depth(leaves: usize) -> usize {
    leaves.next_power_of_two().trailing_zeros() as usize
}

/// Merkleizes `chunks` into a tree sized for `limit` leaves.
pub fn merkleize(chunks: &[B256], limit: usize) -> Result<B256, SchemaViolation> {
    if chunks.len() > limit {
        return Err(SchemaViolation::LengthExceeded { limit, actual: chunks.len() });
    }
    Ok(merkleize_unchecked(chunks, limit))
}

/// Merkleizes `chunks` into a tree sized for `max(limit, chunks.len())` leaves.
pub(crate) fn merkleize_unchecked(chunks: &[B256], limit: usize) -> B256 {
    let depth = tree_depth(limit.max(chunks.len()));
    if chunks.is_empty() {
        return zero_hash(depth);
    }
    let mut layer = chunks.to_vec();
    for zero in ZERO_HASHES.iter().take(depth) {
        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }
        layer = layer.chunks_exact(2).map(|pair| hash_pair(&pair[0], &pair[1])).collect();
    }
    layer[0]
}

/// Sibling hashes from leaf `index` up to the root of a tree sized for `limit` leaves,
/// ordered from the bottom.
pub(crate) fn merkle_branch(chunks: &[B256], limit: usize, index: usize) -> Vec<B256> {
    let depth = tree_depth(limit.max(chunks.len()));
    let mut branch = Vec::with_capacity(depth);
    let mut layer = chunks.to_vec();
    let mut index = index;
    for zero in ZERO_HASHES.iter().take(depth) {
        branch.push(layer.get(index ^ 1).copied().unwrap_or(*zero));
        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }
        layer = layer.chunks_exact(2).map(|pair| hash_pair(&pair[0], &pair[1])).collect();
        index /= 2;
    }
    branch
}

/// Mixes a list length into a root.
pub fn mix_in_length(root: &B256, length: usize) -> B256 {
    mix_in_aux(root, &B256::from(U256::from(length).to_le_bytes::<32>()))
}

/// Mixes an auxiliary root, such as the active-fields root of a stable container, into a
/// root.
pub fn mix_in_aux(root: &B256, aux: &B256) -> B256 {
    hash_pair(root, aux)
}

/// Computes the hash tree root of `value` under `schema`.
pub fn hash_tree_root(schema: &Schema, value: &Value) -> Result<B256, SszError> {
    match (schema, value) {
        (Schema::Boolean | Schema::Uint(_), _) => {
            let mut chunk = B256::ZERO;
            let mut encoded = Vec::with_capacity(BYTES_PER_CHUNK);
            codec::write_basic(schema, value, &mut encoded)?;
            chunk[..encoded.len()].copy_from_slice(&encoded);
            Ok(chunk)
        }
        (Schema::ByteVector(length), Value::Bytes(bytes)) => {
            if bytes.len() != *length {
                return Err(
                    SchemaViolation::LengthMismatch { expected: *length, actual: bytes.len() }.into()
                );
            }
            Ok(merkleize_unchecked(&pack(bytes), length.div_ceil(BYTES_PER_CHUNK)))
        }
        (Schema::ByteList(limit), Value::Bytes(bytes)) => {
            if bytes.len() > *limit {
                return Err(SchemaViolation::LengthExceeded { limit: *limit, actual: bytes.len() }.into());
            }
            let root = merkleize_unchecked(&pack(bytes), limit.div_ceil(BYTES_PER_CHUNK));
            Ok(mix_in_length(&root, bytes.len()))
        }
        (Schema::Vector(element, length), Value::List(items)) => {
            if items.len() != *length {
                return Err(
                    SchemaViolation::LengthMismatch { expected: *length, actual: items.len() }.into()
                );
            }
            elements_root(element, items, *length)
        }
        (Schema::List(element, limit), Value::List(items)) => {
            if items.len() > *limit {
                return Err(SchemaViolation::LengthExceeded { limit: *limit, actual: items.len() }.into());
            }
            Ok(mix_in_length(&elements_root(element, items, *limit)?, items.len()))
        }
        (Schema::Container(fields), Value::Container(values)) => {
            if fields.len() != values.len() {
                return Err(
                    SchemaViolation::FieldCount { expected: fields.len(), actual: values.len() }.into()
                );
            }
            let roots = fields
                .iter()
                .zip(values)
                .map(|(field, value)| hash_tree_root(&field.schema, value))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(merkleize_unchecked(&roots, fields.len()))
        }
        (Schema::StableContainer(schema), Value::Stable(value)) => stable_root(schema, value),
        (Schema::Optional(_), _) => Err(SchemaViolation::MisplacedOptional.into()),
        (schema, _) => Err(SchemaViolation::TypeMismatch { expected: schema.kind() }.into()),
    }
}

fn elements_root(element: &Schema, items: &[Value], limit: usize) -> Result<B256, SszError> {
    if element.is_basic() {
        let mut packed = Vec::new();
        for item in items {
            codec::write_basic(element, item, &mut packed)?;
        }
        return Ok(merkleize_unchecked(&pack(&packed), Schema::packed_chunk_limit(element, limit)));
    }
    let roots =
        items.iter().map(|item| hash_tree_root(element, item)).collect::<Result<Vec<_>, _>>()?;
    Ok(merkleize_unchecked(&roots, limit))
}

/// Roots of every slot up to the last defined field. Inactive slots hash to zero.
pub(crate) fn stable_slot_roots(
    schema: &StableSchema,
    value: &StableValue,
) -> Result<Vec<B256>, SszError> {
    schema.check_shape(value)?;
    (0..schema.fields().len())
        .map(|slot| match (value.get(slot), schema.value_schema(slot)) {
            (Some(field), Some(field_schema)) => hash_tree_root(field_schema, field),
            _ => Ok(B256::ZERO),
        })
        .collect()
}

/// Root of a stable container value.
pub fn stable_root(schema: &StableSchema, value: &StableValue) -> Result<B256, SszError> {
    let roots = stable_slot_roots(schema, value)?;
    let data_root = merkleize_unchecked(&roots, schema.capacity());
    let root = mix_in_aux(&data_root, &value.active_fields().hash_tree_root());
    trace!(target: "ssz_tx::merkle", capacity = schema.capacity(), active = value.len(), %root, "Hashed stable container");
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssz::field;
    use alloy_primitives::{b256, Bytes};

    #[test]
    fn test_zero_hashes() {
        assert_eq!(zero_hash(0), B256::ZERO);
        assert_eq!(
            zero_hash(1),
            b256!("f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b")
        );
        assert_eq!(merkleize_unchecked(&[], 4), zero_hash(2));
    }

    #[test]
    fn test_merkleize_pads_virtually() {
        let a = B256::repeat_byte(1);
        let b = B256::repeat_byte(2);
        let explicit = hash_pair(&hash_pair(&a, &b), &hash_pair(&B256::ZERO, &B256::ZERO));
        assert_eq!(merkleize(&[a, b], 4), Ok(explicit));
        assert_eq!(merkleize(&[a], 1), Ok(a));
        assert_eq!(
            merkleize(&[a, b], 1),
            Err(SchemaViolation::LengthExceeded { limit: 1, actual: 2 })
        );
    }

    #[test]
    fn test_branch_rebuilds_root() {
        let chunks: Vec<_> = (1..=5u8).map(B256::repeat_byte).collect();
        let root = merkleize_unchecked(&chunks, 16);
        for (index, leaf) in chunks.iter().enumerate() {
            let branch = merkle_branch(&chunks, 16, index);
            assert_eq!(branch.len(), 4);
            let computed = branch.iter().enumerate().fold(*leaf, |node, (depth, sibling)| {
                if index >> depth & 1 == 1 {
                    hash_pair(sibling, &node)
                } else {
                    hash_pair(&node, sibling)
                }
            });
            assert_eq!(computed, root);
        }
    }

    #[test]
    fn test_basic_roots() {
        let root = hash_tree_root(&Schema::UINT64, &Value::uint(0x0102u64)).unwrap();
        let mut expected = B256::ZERO;
        expected[0] = 0x02;
        expected[1] = 0x01;
        assert_eq!(root, expected);
        assert_eq!(
            hash_tree_root(&Schema::Uint(8), &Value::uint(256u64)),
            Err(SchemaViolation::UintOverflow { bits: 8 }.into())
        );
    }

    #[test]
    fn test_byte_list_mixes_length() {
        let bytes = Bytes::from(vec![0xaa; 40]);
        let root = hash_tree_root(&Schema::ByteList(64), &Value::Bytes(bytes.clone())).unwrap();
        let data = merkleize_unchecked(&pack(&bytes), 2);
        assert_eq!(root, mix_in_length(&data, 40));
        assert!(hash_tree_root(&Schema::ByteList(32), &Value::Bytes(bytes)).is_err());
    }

    #[test]
    fn test_packed_list_of_uint64() {
        let schema = Schema::list(Schema::UINT64, 8);
        let value = Value::List(vec![Value::uint(1u64), Value::uint(2u64)]);
        let mut packed = Vec::new();
        packed.extend_from_slice(&1u64.to_le_bytes());
        packed.extend_from_slice(&2u64.to_le_bytes());
        let expected = mix_in_length(&merkleize_unchecked(&pack(&packed), 2), 2);
        assert_eq!(hash_tree_root(&schema, &value).unwrap(), expected);
    }

    #[test]
    fn test_optional_outside_stable_container() {
        let schema = Schema::Container(vec![field("a", Schema::optional(Schema::UINT8))]);
        let value = Value::Container(vec![Value::uint(1u64)]);
        assert_eq!(
            hash_tree_root(&schema, &value),
            Err(SchemaViolation::MisplacedOptional.into())
        );
    }

    #[test]
    fn test_stable_root_ignores_reserved_slots() {
        let two = StableSchema::new(
            32,
            vec![field("a", Schema::UINT64), field("b", Schema::optional(Schema::UINT64))],
        );
        let three = two.extended(vec![field("c", Schema::optional(Schema::BYTES32))]);
        let value = StableValue::new(32).with(0, Value::uint(1u64)).with(1, Value::uint(2u64));
        assert_eq!(stable_root(&two, &value), stable_root(&three, &value));

        let other = StableValue::new(33).with(0, Value::uint(1u64));
        assert_eq!(
            stable_root(&two, &other),
            Err(SszError::CapacityMisconfiguration { schema: 32, value: 33 })
        );
    }
}
