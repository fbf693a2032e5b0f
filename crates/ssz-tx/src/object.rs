//! Typed views over schema-described SSZ values.

use alloy_primitives::{FixedBytes, B256};

use crate::ssz::{self, Schema, SchemaViolation, SszError, StableValue, Value};

/// A domain type with a fixed SSZ schema.
///
/// Implementors only describe how to map to and from a dynamic [`Value`]; hashing and the
/// canonical encoding come from the engine.
pub trait SszObject: Sized {
    /// Schema of the type.
    fn schema() -> &'static Schema;

    /// Converts the object into a dynamic value.
    fn to_value(&self) -> Value;

    /// Builds the object from a dynamic value.
    fn from_value(value: &Value) -> Result<Self, SszError>;

    /// Hash tree root of the object.
    fn hash_tree_root(&self) -> Result<B256, SszError> {
        ssz::hash_tree_root(Self::schema(), &self.to_value())
    }

    /// Canonical SSZ encoding of the object.
    fn ssz_bytes(&self) -> Result<Vec<u8>, SszError> {
        ssz::serialize(Self::schema(), &self.to_value())
    }

    /// Decodes the object from its canonical SSZ encoding.
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszError> {
        Self::from_value(&ssz::deserialize(Self::schema(), bytes)?)
    }
}

/// Returns the stable container value of `value`, checked against `schema`.
pub(crate) fn stable_value<'a>(schema: &Schema, value: &'a Value) -> Result<&'a StableValue, SszError> {
    let stable = value.as_stable()?;
    match schema {
        Schema::StableContainer(schema) => schema.check_shape(stable)?,
        schema => return Err(SchemaViolation::TypeMismatch { expected: schema.kind() }.into()),
    }
    Ok(stable)
}

/// Converts fixed-size byte arrays into a list value.
pub(crate) fn fixed_list<const N: usize>(items: &[FixedBytes<N>]) -> Value {
    Value::List(items.iter().map(|item| Value::fixed(*item)).collect())
}

/// Parses a list value of fixed-size byte arrays.
pub(crate) fn parse_fixed_list<const N: usize>(value: &Value) -> Result<Vec<FixedBytes<N>>, SchemaViolation> {
    value.as_list()?.iter().map(Value::as_fixed::<N>).collect()
}
