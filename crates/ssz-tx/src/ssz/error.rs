//! Error types for the SSZ engine.

/// Errors raised while hashing, serializing or deserializing SSZ values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SszError {
    /// The value does not conform to its schema.
    #[error("Schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),
    /// The byte layout is not a canonical encoding of the schema.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(#[from] MalformedEncoding),
    /// A stable container value was built for a different capacity than the schema declares.
    #[error("Capacity misconfiguration: schema declares {schema} field slots, value was built for {value}")]
    CapacityMisconfiguration {
        /// Capacity declared by the schema.
        schema: usize,
        /// Capacity recorded in the value.
        value: usize,
    },
}

/// Ways a value can violate its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    /// The value variant does not match the schema variant.
    #[error("Expected a {expected} value")]
    TypeMismatch {
        /// Human readable name of the expected kind.
        expected: &'static str,
    },
    /// An integer does not fit into the declared bit width.
    #[error("Integer does not fit in uint{bits}")]
    UintOverflow {
        /// Declared width.
        bits: usize,
    },
    /// A fixed-length value has the wrong length.
    #[error("Expected length {expected}, got {actual}")]
    LengthMismatch {
        /// Declared length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// A bounded value exceeds its limit.
    #[error("Length {actual} exceeds limit {limit}")]
    LengthExceeded {
        /// Declared limit.
        limit: usize,
        /// Actual length.
        actual: usize,
    },
    /// A container value has the wrong number of fields.
    #[error("Expected {expected} fields, got {actual}")]
    FieldCount {
        /// Declared field count.
        expected: usize,
        /// Actual field count.
        actual: usize,
    },
    /// A required stable container field is inactive.
    #[error("Required field `{0}` is inactive")]
    MissingField(&'static str),
    /// A stable container value activates a slot that the schema does not define.
    #[error("Slot {0} is not defined by the schema")]
    UndefinedField(usize),
    /// An `Optional` schema appears outside of a stable container.
    #[error("Optional values are only allowed as stable container fields")]
    MisplacedOptional,
    /// Two partial values disagree on the content of a slot.
    #[error("Conflicting values for slot {0}")]
    ConflictingField(usize),
}

/// Ways a byte string can fail to be a canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEncoding {
    /// The input ends before the value does.
    #[error("Input too short: need {expected} bytes, have {actual}")]
    Truncated {
        /// Bytes needed.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },
    /// Bytes remain after the value.
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
    /// The first offset does not point right after the fixed section.
    #[error("First offset {offset} does not match fixed section length {expected}")]
    InvalidFirstOffset {
        /// Offset found.
        offset: usize,
        /// Expected offset.
        expected: usize,
    },
    /// Offsets decrease or point past the end of the input.
    #[error("Offset {offset} out of range (previous {previous}, end {end})")]
    OffsetOutOfRange {
        /// Offset found.
        offset: usize,
        /// Previous offset.
        previous: usize,
        /// End of the input.
        end: usize,
    },
    /// A fixed-size element list is not a whole number of elements.
    #[error("Length {actual} is not a multiple of element size {element}")]
    NotAMultiple {
        /// Input length.
        actual: usize,
        /// Element size.
        element: usize,
    },
    /// A decoded length exceeds the declared limit.
    #[error("Decoded length {actual} exceeds limit {limit}")]
    LengthExceeded {
        /// Declared limit.
        limit: usize,
        /// Decoded length.
        actual: usize,
    },
    /// A boolean byte other than 0 or 1.
    #[error("Invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),
    /// An active-fields bit is set for a slot that is undefined or beyond capacity.
    #[error("Active field bit {0} is not defined by the schema")]
    UnknownActiveField(usize),
    /// A required stable container field is not active.
    #[error("Required field `{0}` is not active")]
    MissingField(&'static str),
}
