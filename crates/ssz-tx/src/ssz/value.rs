//! Dynamic SSZ values.

use std::collections::BTreeMap;

use alloy_primitives::{ruint::UintTryFrom, Address, Bytes, FixedBytes, U256};

use super::{merkle, MalformedEncoding, SchemaViolation};
use crate::constants::merkle::BITS_PER_CHUNK;

/// An SSZ value, interpreted against a [`Schema`](super::Schema).
///
/// Vectors and lists share the `List` variant. Byte vectors and byte lists share `Bytes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// `boolean`.
    Bool(bool),
    /// Any `uintN`.
    Uint(U256),
    /// `ByteVector[N]` or `ByteList[N]`.
    Bytes(Bytes),
    /// Elements of a `Vector` or `List`.
    List(Vec<Value>),
    /// Fields of a `Container`, in schema order.
    Container(Vec<Value>),
    /// A `StableContainer` value.
    Stable(StableValue),
}

impl Value {
    /// Creates a `uintN` value.
    pub fn uint<T>(value: T) -> Self
    where
        U256: UintTryFrom<T>,
    {
        Self::Uint(U256::from(value))
    }

    /// Creates a byte value.
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }

    /// Creates a byte value from a fixed-size array.
    pub fn fixed<const N: usize>(value: FixedBytes<N>) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value.as_slice()))
    }

    /// Creates a byte value from an address.
    pub fn address(value: Address) -> Self {
        Self::fixed(value.0)
    }

    /// Returns the boolean.
    pub fn as_bool(&self) -> Result<bool, SchemaViolation> {
        match self {
            Self::Bool(value) => Ok(*value),
            _ => Err(SchemaViolation::TypeMismatch { expected: "boolean" }),
        }
    }

    /// Returns the integer.
    pub fn as_uint(&self) -> Result<U256, SchemaViolation> {
        match self {
            Self::Uint(value) => Ok(*value),
            _ => Err(SchemaViolation::TypeMismatch { expected: "uint" }),
        }
    }

    /// Returns the integer as `u64`.
    pub fn as_u64(&self) -> Result<u64, SchemaViolation> {
        self.as_uint()?.try_into().map_err(|_| SchemaViolation::UintOverflow { bits: 64 })
    }

    /// Returns the integer as `u8`.
    pub fn as_u8(&self) -> Result<u8, SchemaViolation> {
        self.as_uint()?.try_into().map_err(|_| SchemaViolation::UintOverflow { bits: 8 })
    }

    /// Returns the bytes.
    pub fn as_bytes(&self) -> Result<&Bytes, SchemaViolation> {
        match self {
            Self::Bytes(value) => Ok(value),
            _ => Err(SchemaViolation::TypeMismatch { expected: "bytes" }),
        }
    }

    /// Returns the bytes as a fixed-size array.
    pub fn as_fixed<const N: usize>(&self) -> Result<FixedBytes<N>, SchemaViolation> {
        let bytes = self.as_bytes()?;
        FixedBytes::try_from(bytes.as_ref())
            .map_err(|_| SchemaViolation::LengthMismatch { expected: N, actual: bytes.len() })
    }

    /// Returns the bytes as an address.
    pub fn as_address(&self) -> Result<Address, SchemaViolation> {
        self.as_fixed::<20>().map(Address::from)
    }

    /// Returns the elements of a vector or list.
    pub fn as_list(&self) -> Result<&[Self], SchemaViolation> {
        match self {
            Self::List(values) => Ok(values),
            _ => Err(SchemaViolation::TypeMismatch { expected: "sequence" }),
        }
    }

    /// Returns the fields of a container.
    pub fn as_container(&self) -> Result<&[Self], SchemaViolation> {
        match self {
            Self::Container(values) => Ok(values),
            _ => Err(SchemaViolation::TypeMismatch { expected: "container" }),
        }
    }

    /// Returns the fields of a container with exactly `N` fields.
    pub fn as_fields<const N: usize>(&self) -> Result<&[Self; N], SchemaViolation> {
        let fields = self.as_container()?;
        fields.try_into().map_err(|_| SchemaViolation::FieldCount { expected: N, actual: fields.len() })
    }

    /// Returns the stable container value.
    pub fn as_stable(&self) -> Result<&StableValue, SchemaViolation> {
        match self {
            Self::Stable(value) => Ok(value),
            _ => Err(SchemaViolation::TypeMismatch { expected: "stable container" }),
        }
    }

    /// Consumes the value and returns the stable container value.
    pub fn into_stable(self) -> Result<StableValue, SchemaViolation> {
        match self {
            Self::Stable(value) => Ok(value),
            _ => Err(SchemaViolation::TypeMismatch { expected: "stable container" }),
        }
    }
}

impl From<StableValue> for Value {
    fn from(value: StableValue) -> Self {
        Self::Stable(value)
    }
}

/// A stable container value: the capacity it was built for plus the values of its active
/// slots.
///
/// The active-fields bitvector is exactly the key set of the slot map, so the two can never
/// disagree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StableValue {
    capacity: usize,
    fields: BTreeMap<usize, Value>,
}

impl StableValue {
    /// Creates an empty value for a stable container of the given capacity.
    pub const fn new(capacity: usize) -> Self {
        Self { capacity, fields: BTreeMap::new() }
    }

    /// Capacity this value was built for.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the value at `slot`, if active.
    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.fields.get(&slot)
    }

    /// Returns the value at `slot`, failing with [`SchemaViolation::MissingField`] if the
    /// slot is inactive.
    pub fn required(&self, slot: usize, name: &'static str) -> Result<&Value, SchemaViolation> {
        self.get(slot).ok_or(SchemaViolation::MissingField(name))
    }

    /// Returns `true` if `slot` is active.
    pub fn is_active(&self, slot: usize) -> bool {
        self.fields.contains_key(&slot)
    }

    /// Activates `slot` with `value`, returning the previous value.
    ///
    /// Slots beyond the capacity or the defined fields are rejected when the value is hashed
    /// or serialized.
    pub fn insert(&mut self, slot: usize, value: Value) -> Option<Value> {
        self.fields.insert(slot, value)
    }

    /// Deactivates `slot`, returning its value.
    pub fn remove(&mut self, slot: usize) -> Option<Value> {
        self.fields.remove(&slot)
    }

    /// Builder form of [`Self::insert`].
    pub fn with(mut self, slot: usize, value: Value) -> Self {
        self.insert(slot, value);
        self
    }

    /// Builder form of [`Self::insert`] that leaves the slot inactive on `None`.
    pub fn with_optional(mut self, slot: usize, value: Option<Value>) -> Self {
        if let Some(value) = value {
            self.insert(slot, value);
        }
        self
    }

    /// Active slots in increasing order.
    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields.keys().copied()
    }

    /// Active slots and their values in increasing slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.fields.iter().map(|(slot, value)| (*slot, value))
    }

    /// Number of active slots.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no slot is active.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the active-fields bitvector.
    pub fn active_fields(&self) -> ActiveFields {
        let mut active = ActiveFields::new(self.capacity);
        for slot in self.active_slots().filter(|slot| *slot < self.capacity) {
            active.set(slot);
        }
        active
    }
}

/// `Bitvector[capacity]` recording which stable container slots are active.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8`, least significant bit first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActiveFields {
    capacity: usize,
    bytes: Vec<u8>,
}

impl ActiveFields {
    /// Creates a bitvector with every bit cleared.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, bytes: vec![0; capacity.div_ceil(8)] }
    }

    /// Parses the serialized form, rejecting set bits at or beyond `capacity`.
    pub fn from_bytes(capacity: usize, bytes: &[u8]) -> Result<Self, MalformedEncoding> {
        let expected = capacity.div_ceil(8);
        if bytes.len() < expected {
            return Err(MalformedEncoding::Truncated { expected, actual: bytes.len() });
        }
        let active = Self { capacity, bytes: bytes[..expected].to_vec() };
        if let Some(bit) = (capacity..expected * 8).find(|bit| active.bit(*bit)) {
            return Err(MalformedEncoding::UnknownActiveField(bit));
        }
        Ok(active)
    }

    /// Number of bits.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Serialized form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `true` if `slot` is active.
    pub fn get(&self, slot: usize) -> bool {
        slot < self.capacity && self.bit(slot)
    }

    /// Sets the bit for `slot`. Slots beyond the capacity are ignored.
    pub fn set(&mut self, slot: usize) {
        if slot < self.capacity {
            self.bytes[slot / 8] |= 1 << (slot % 8);
        }
    }

    /// Active slots in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity).filter(|slot| self.bit(*slot))
    }

    /// Number of active slots.
    pub fn count(&self) -> usize {
        self.bytes.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    /// Returns `true` if every slot active in `self` is active in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.capacity == other.capacity &&
            self.bytes.iter().zip(&other.bytes).all(|(ours, theirs)| ours & !theirs == 0)
    }

    /// Merkle root of the bitvector.
    pub fn hash_tree_root(&self) -> alloy_primitives::B256 {
        let chunks = merkle::pack(&self.bytes);
        merkle::merkleize_unchecked(&chunks, self.capacity.div_ceil(BITS_PER_CHUNK))
    }

    fn bit(&self, bit: usize) -> bool {
        self.bytes[bit / 8] >> (bit % 8) & 1 == 1
    }
}
