use crate::wire::WireType;

/// Errors that can occur while decoding an untrusted buffer.
///
/// All of these are terminal for the decode call that produced them, no
/// partially decoded message is ever returned alongside one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer is shorter than a declared or implied length.
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,
    /// A varint ran past 10 bytes or does not fit in 64 bits.
    #[error("integer overflow: varint exceeds 64 bits")]
    IntegerOverflow,
    /// A length prefix is negative (as a signed 64-bit value) or larger than the
    /// bytes that remain.
    #[error("invalid length prefix: {value}")]
    InvalidLength { value: u64 },
    /// A known field arrived with a wire type that disagrees with its schema.
    #[error("wrong wire type {actual:?} for field '{message}.{field}', expected {expected:?}")]
    WireTypeMismatch {
        message: &'static str,
        field: &'static str,
        expected: WireType,
        actual: WireType,
    },
    #[error("illegal tag: {reason}")]
    IllegalTag { reason: IllegalTagReason },
    /// A start-group was never closed before the end of the buffer.
    #[error("unterminated group")]
    UnterminatedGroup,
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    /// A `string` field holds bytes that are not UTF-8. Go peers accept such
    /// payloads unchecked, decoding here rejects them.
    #[error("invalid UTF-8 in string field '{field}'")]
    InvalidUtf8 { field: &'static str },
    /// Embedded messages or groups are nested deeper than allowed.
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: u32 },
}

impl DecodeError {
    #[inline(never)]
    #[cold]
    pub(crate) const fn illegal_tag(reason: IllegalTagReason) -> Self {
        DecodeError::IllegalTag { reason }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalTagReason {
    #[error("field number is zero")]
    ZeroFieldNumber,
    #[error("field number exceeds 2^29 - 1")]
    FieldNumberOutOfRange,
    #[error("end group outside of a group")]
    UnexpectedEndGroup,
}

/// Errors that can occur while encoding into a caller supplied buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("insufficient buffer capacity: required {required}, remaining {remaining}")]
    InsufficientCapacity { required: usize, remaining: usize },
}
