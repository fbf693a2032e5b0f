//! Schema descriptions for SSZ values.

use super::{SchemaViolation, SszError, StableValue};
use crate::constants::merkle::BYTES_PER_CHUNK;

/// Shape of an SSZ value.
///
/// Merkleization and the codec dispatch on this closed set of variants. `Optional` is only
/// meaningful as the direct schema of a [`StableSchema`] field, where it marks the field as
/// allowed to be inactive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schema {
    /// `boolean`.
    Boolean,
    /// `uintN` with `N` in `{8, 16, 32, 64, 128, 256}`.
    Uint(usize),
    /// `ByteVector[N]`.
    ByteVector(usize),
    /// `ByteList[N]`.
    ByteList(usize),
    /// `Vector[T, N]`.
    Vector(Box<Schema>, usize),
    /// `List[T, N]`.
    List(Box<Schema>, usize),
    /// A container whose fields are always present.
    Container(Vec<Field>),
    /// A container with individually optional fields and a pinned slot capacity.
    StableContainer(StableSchema),
    /// A field that may be inactive in its enclosing stable container.
    Optional(Box<Schema>),
}

/// A named container field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field name.
    pub name: &'static str,
    /// Field schema.
    pub schema: Schema,
}

/// Shorthand for building a [`Field`].
pub fn field(name: &'static str, schema: Schema) -> Field {
    Field { name, schema }
}

impl Schema {
    /// `uint8`.
    pub const UINT8: Self = Self::Uint(8);
    /// `uint64`.
    pub const UINT64: Self = Self::Uint(64);
    /// `uint256`.
    pub const UINT256: Self = Self::Uint(256);
    /// `Bytes32`.
    pub const BYTES32: Self = Self::ByteVector(32);

    /// Creates a `uintN` schema.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not a supported width.
    pub fn uint(bits: usize) -> Self {
        assert!(matches!(bits, 8 | 16 | 32 | 64 | 128 | 256), "unsupported uint width {bits}");
        Self::Uint(bits)
    }

    /// Creates a `Vector[T, N]` schema.
    pub fn vector(element: Self, length: usize) -> Self {
        Self::Vector(Box::new(element), length)
    }

    /// Creates a `List[T, N]` schema.
    pub fn list(element: Self, limit: usize) -> Self {
        Self::List(Box::new(element), limit)
    }

    /// Creates an `Optional[T]` schema.
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Creates a `StableContainer[N]` schema.
    ///
    /// # Panics
    ///
    /// Panics if more fields are defined than the capacity allows. Capacities are static
    /// configuration, so this is a programming error.
    pub fn stable_container(capacity: usize, fields: Vec<Field>) -> Self {
        Self::StableContainer(StableSchema::new(capacity, fields))
    }

    /// Returns `true` for `boolean` and `uintN`.
    pub const fn is_basic(&self) -> bool {
        matches!(self, Self::Boolean | Self::Uint(_))
    }

    /// Returns the encoded size of the schema if every value has the same size.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Boolean => Some(1),
            Self::Uint(bits) => Some(bits / 8),
            Self::ByteVector(length) => Some(*length),
            Self::Vector(element, length) => element.fixed_size().map(|size| size * length),
            Self::Container(fields) => {
                fields.iter().map(|field| field.schema.fixed_size()).sum::<Option<usize>>()
            }
            Self::Optional(inner) => inner.fixed_size(),
            Self::ByteList(_) | Self::List(..) | Self::StableContainer(_) => None,
        }
    }

    /// Returns `true` if the encoded size of the schema depends on the value.
    pub fn is_variable_size(&self) -> bool {
        self.fixed_size().is_none()
    }

    /// Number of chunks a packed vector or list of basic elements occupies at its limit.
    pub(crate) fn packed_chunk_limit(element: &Self, limit: usize) -> usize {
        let size = element.fixed_size().unwrap_or(BYTES_PER_CHUNK);
        (limit * size).div_ceil(BYTES_PER_CHUNK)
    }

    /// Human readable kind, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Uint(_) => "uint",
            Self::ByteVector(_) | Self::ByteList(_) => "bytes",
            Self::Vector(..) | Self::List(..) => "sequence",
            Self::Container(_) => "container",
            Self::StableContainer(_) => "stable container",
            Self::Optional(_) => "optional",
        }
    }
}

/// Schema of a stable container: an ordered list of field slots plus a capacity that is
/// fixed when the schema is first published.
///
/// Slot `i` always holds the `i`-th defined field. New fields may only be appended into the
/// reserved slots below `capacity`, which keeps the roots of existing values unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableSchema {
    capacity: usize,
    fields: Vec<Field>,
}

impl StableSchema {
    /// Creates a new stable container schema.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or smaller than the number of fields.
    pub fn new(capacity: usize, fields: Vec<Field>) -> Self {
        assert!(capacity > 0, "stable container capacity must be non-zero");
        assert!(
            fields.len() <= capacity,
            "stable container defines {} fields but has capacity {capacity}",
            fields.len()
        );
        Self { capacity, fields }
    }

    /// Maximum number of field slots.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Defined fields, in slot order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field defined at `slot`.
    pub fn field(&self, slot: usize) -> Option<&Field> {
        self.fields.get(slot)
    }

    /// Returns the slot of the field named `name`.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Returns `true` if the field at `slot` may be inactive.
    pub fn is_optional(&self, slot: usize) -> bool {
        matches!(self.fields.get(slot), Some(Field { schema: Schema::Optional(_), .. }))
    }

    /// Returns the schema of the value stored at `slot`, looking through `Optional`.
    pub fn value_schema(&self, slot: usize) -> Option<&Schema> {
        self.fields.get(slot).map(|field| match &field.schema {
            Schema::Optional(inner) => inner.as_ref(),
            schema => schema,
        })
    }

    /// Size in bytes of the serialized active-fields bitvector.
    pub const fn active_fields_len(&self) -> usize {
        self.capacity.div_ceil(8)
    }

    /// Returns the same slots and capacity with every field made optional.
    ///
    /// Summaries are hashed and encoded against this view: positions are untouched, so the
    /// root contributed by a retained field is the same as in the full value.
    pub fn summary_view(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|f| match &f.schema {
                Schema::Optional(_) => f.clone(),
                schema => field(f.name, Schema::optional(schema.clone())),
            })
            .collect();
        Self { capacity: self.capacity, fields }
    }

    /// Checks that `value` was built for this capacity, only activates defined slots and
    /// activates every required slot.
    pub fn check_shape(&self, value: &StableValue) -> Result<(), SszError> {
        if value.capacity() != self.capacity {
            return Err(SszError::CapacityMisconfiguration {
                schema: self.capacity,
                value: value.capacity(),
            });
        }
        if let Some(slot) = value.active_slots().find(|slot| *slot >= self.fields.len()) {
            return Err(SchemaViolation::UndefinedField(slot).into());
        }
        if let Some((_, field)) = self
            .fields
            .iter()
            .enumerate()
            .find(|(slot, field)| !value.is_active(*slot) && !matches!(field.schema, Schema::Optional(_)))
        {
            return Err(SchemaViolation::MissingField(field.name).into());
        }
        Ok(())
    }

    /// Returns a copy with `extra` appended into the reserved slots.
    ///
    /// # Panics
    ///
    /// Panics if a new field is not optional or the capacity would be exceeded.
    pub fn extended(&self, extra: Vec<Field>) -> Self {
        assert!(
            extra.iter().all(|f| matches!(f.schema, Schema::Optional(_))),
            "fields added to a published stable container must be optional"
        );
        let mut fields = self.fields.clone();
        fields.extend(extra);
        Self::new(self.capacity, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size() {
        assert_eq!(Schema::Boolean.fixed_size(), Some(1));
        assert_eq!(Schema::UINT256.fixed_size(), Some(32));
        assert_eq!(Schema::vector(Schema::UINT64, 3).fixed_size(), Some(24));
        assert_eq!(
            Schema::Container(vec![field("a", Schema::UINT8), field("b", Schema::BYTES32)])
                .fixed_size(),
            Some(33)
        );
        assert_eq!(
            Schema::Container(vec![field("a", Schema::UINT8), field("b", Schema::ByteList(4))])
                .fixed_size(),
            None
        );
        assert!(Schema::stable_container(4, vec![field("a", Schema::UINT8)]).is_variable_size());
    }

    #[test]
    fn test_summary_view_keeps_positions() {
        let schema = StableSchema::new(
            8,
            vec![field("a", Schema::UINT64), field("b", Schema::optional(Schema::UINT8))],
        );
        let view = schema.summary_view();
        assert_eq!(view.capacity(), 8);
        assert!(view.is_optional(0));
        assert!(view.is_optional(1));
        assert_eq!(view.value_schema(0), Some(&Schema::UINT64));
        assert_eq!(view.slot_of("b"), Some(1));
    }

    #[test]
    fn test_check_shape() {
        use crate::ssz::Value;

        let schema = StableSchema::new(
            4,
            vec![field("a", Schema::UINT64), field("b", Schema::optional(Schema::UINT8))],
        );
        assert!(schema.check_shape(&StableValue::new(4).with(0, Value::uint(1u64))).is_ok());
        assert_eq!(
            schema.check_shape(&StableValue::new(4).with(1, Value::uint(1u64))),
            Err(SchemaViolation::MissingField("a").into())
        );
        assert_eq!(
            schema.check_shape(&StableValue::new(4).with(0, Value::uint(1u64)).with(3, Value::Bool(true))),
            Err(SchemaViolation::UndefinedField(3).into())
        );
        assert_eq!(
            schema.check_shape(&StableValue::new(8).with(0, Value::uint(1u64))),
            Err(SszError::CapacityMisconfiguration { schema: 4, value: 8 })
        );
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn test_capacity_overflow_panics() {
        let _ = Schema::stable_container(1, vec![field("a", Schema::UINT8), field("b", Schema::UINT8)]);
    }
}
