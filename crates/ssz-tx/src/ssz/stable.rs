//! Partial views of stable container values: summaries and single-field proofs.

use alloy_primitives::B256;

use super::{
    codec,
    merkle::{self, hash_pair, mix_in_aux, tree_depth},
    Schema, SchemaViolation, SszError, StableSchema, StableValue, Value,
};

/// A stable container value reduced to a subset of its active fields.
///
/// Retained fields keep their slots, so each contributes the same leaf to the summary's tree
/// as it does to the full value's tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    schema: StableSchema,
    value: StableValue,
}

impl Summary {
    /// The all-optional view the summary is encoded and hashed against.
    pub const fn schema(&self) -> &StableSchema {
        &self.schema
    }

    /// Retained fields.
    pub const fn value(&self) -> &StableValue {
        &self.value
    }

    /// Consumes the summary and returns the retained fields.
    pub fn into_value(self) -> StableValue {
        self.value
    }

    /// Root of the summary.
    pub fn hash_tree_root(&self) -> Result<B256, SszError> {
        merkle::stable_root(&self.schema, &self.value)
    }

    /// Canonical encoding of the summary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SszError> {
        codec::serialize(&Schema::StableContainer(self.schema.clone()), &Value::Stable(self.value.clone()))
    }

    /// Decodes a summary of a value of `schema`.
    pub fn from_bytes(schema: &StableSchema, bytes: &[u8]) -> Result<Self, SszError> {
        let view = schema.summary_view();
        let value = codec::deserialize(&Schema::StableContainer(view.clone()), bytes)?.into_stable()?;
        Ok(Self { schema: view, value })
    }

    /// Proof for one retained slot against the summary root.
    pub fn field_proof(&self, slot: usize) -> Result<FieldProof, SszError> {
        field_proof(&self.schema, &self.value, slot)
    }
}

/// Keeps the fields of `value` whose slots are listed in `keep`. Listed slots that are
/// inactive in `value` stay inactive.
pub fn summarize(schema: &StableSchema, value: &StableValue, keep: &[usize]) -> Result<Summary, SszError> {
    schema.check_shape(value)?;
    if let Some(slot) = keep.iter().find(|slot| **slot >= schema.fields().len()) {
        return Err(SchemaViolation::UndefinedField(*slot).into());
    }
    let retained = value
        .iter()
        .filter(|(slot, _)| keep.contains(slot))
        .fold(StableValue::new(value.capacity()), |summary, (slot, field)| {
            summary.with(slot, field.clone())
        });
    Ok(Summary { schema: schema.summary_view(), value: retained })
}

/// Merges a summary with the fields it omitted. Slots present in both must agree.
pub fn expand(schema: &StableSchema, summary: &Summary, rest: &StableValue) -> Result<StableValue, SszError> {
    for part in [summary.value(), rest] {
        if part.capacity() != schema.capacity() {
            return Err(SszError::CapacityMisconfiguration {
                schema: schema.capacity(),
                value: part.capacity(),
            });
        }
    }
    let mut merged = summary.value().clone();
    for (slot, field) in rest.iter() {
        match merged.get(slot) {
            Some(existing) if existing != field => {
                return Err(SchemaViolation::ConflictingField(slot).into());
            }
            Some(_) => {}
            None => {
                merged.insert(slot, field.clone());
            }
        }
    }
    schema.check_shape(&merged)?;
    Ok(merged)
}

/// Merkle proof for a single stable container slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldProof {
    /// Proven slot.
    pub slot: usize,
    /// Root of the slot's value, or zero if the slot is inactive.
    pub leaf: B256,
    /// Sibling hashes from the leaf up to the data root, ordered from the bottom.
    pub branch: Vec<B256>,
    /// Root of the active fields bitvector mixed into the container root.
    pub active_fields_root: B256,
}

impl FieldProof {
    /// Generalized index of the leaf within the container tree.
    pub fn generalized_index(&self) -> usize {
        (1 << (self.branch.len() + 1)) + self.slot
    }

    /// Recomputes the container root from the proof.
    pub fn compute_root(&self) -> B256 {
        let data_root = self.branch.iter().enumerate().fold(self.leaf, |node, (depth, sibling)| {
            if self.slot >> depth & 1 == 1 {
                hash_pair(sibling, &node)
            } else {
                hash_pair(&node, sibling)
            }
        });
        mix_in_aux(&data_root, &self.active_fields_root)
    }

    /// Returns `true` if the proof commits to `root`.
    pub fn verify(&self, root: &B256) -> bool {
        self.compute_root() == *root
    }
}

/// Builds a proof for `slot` of `value`.
pub fn field_proof(schema: &StableSchema, value: &StableValue, slot: usize) -> Result<FieldProof, SszError> {
    if slot >= schema.capacity() {
        return Err(SchemaViolation::UndefinedField(slot).into());
    }
    let roots = merkle::stable_slot_roots(schema, value)?;
    let leaf = roots.get(slot).copied().unwrap_or(B256::ZERO);
    let branch = merkle::merkle_branch(&roots, schema.capacity(), slot);
    debug_assert_eq!(branch.len(), tree_depth(schema.capacity()));
    Ok(FieldProof { slot, leaf, branch, active_fields_root: value.active_fields().hash_tree_root() })
}
