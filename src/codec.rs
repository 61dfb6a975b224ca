//! Encoding and decoding traits for protobuf wire format.

mod default_check;
mod delimited;
mod message;

use crate::config::DecodeContext;
use crate::error::DecodeError;
use crate::wire::{encode_key, encoded_key_len, WireType, MINIMUM_FIELD_NUMBER};

pub trait ProtoType: Sized {
    /// The wire type used to encode and decode this type.
    const WIRE_TYPE: WireType;
}

/// A type that can be decoded from protobuf wire format.
///
/// The `decode_into` method follows protobuf merging semantics:
/// - Scalars: last value wins (overwrite)
/// - Embedded messages: recursive merge
pub trait ProtoDecode: ProtoType {
    /// Decode the payload of `field` (its key already consumed) from buffer
    /// into dst.
    fn decode_into<B: bytes::Buf>(
        buf: &mut B,
        dst: &mut Self,
        field: &'static FieldDescriptor,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>;
}

/// A type that can be encoded to protobuf wire format.
pub trait ProtoEncode: ProtoType {
    /// Encode this value to the buffer.
    fn encode<B: bytes::BufMut>(&self, buf: &mut B);

    /// Returns the encoded length of this value (not including field key).
    fn encoded_len(&self) -> usize;
}

/// The semantic type of a message field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Raw `bytes`.
    Bytes,
    /// UTF-8 `string`.
    String,
    /// An embedded message.
    Message,
}

impl FieldKind {
    /// The wire type fields of this kind are encoded with.
    pub const fn wire_type(self) -> WireType {
        match self {
            FieldKind::Bytes | FieldKind::String | FieldKind::Message => WireType::Len,
        }
    }
}

/// Static description of a single message field.
///
/// Every message type exposes a table of these, sorted by field number, via
/// [`ProtoMessage::FIELDS`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub number: u32,
    pub wire_type: WireType,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, number: u32, kind: FieldKind) -> Self {
        Self {
            name,
            number,
            wire_type: kind.wire_type(),
            kind,
        }
    }

    pub const fn bytes(name: &'static str, number: u32) -> Self {
        Self::new(name, number, FieldKind::Bytes)
    }

    pub const fn string(name: &'static str, number: u32) -> Self {
        Self::new(name, number, FieldKind::String)
    }

    pub const fn message(name: &'static str, number: u32) -> Self {
        Self::new(name, number, FieldKind::Message)
    }
}

/// Returns `true` if `fields` are valid, strictly ascending field numbers.
///
/// Intended for compile-time checks of descriptor tables:
///
/// ```
/// use protowire::codec::{fields_are_ascending, FieldDescriptor};
///
/// const FIELDS: &[FieldDescriptor] = &[
///     FieldDescriptor::string("name", 1),
///     FieldDescriptor::bytes("key", 4),
/// ];
/// const _: () = assert!(fields_are_ascending(FIELDS));
/// ```
pub const fn fields_are_ascending(fields: &[FieldDescriptor]) -> bool {
    let mut previous = MINIMUM_FIELD_NUMBER - 1;
    let mut i = 0;
    while i < fields.len() {
        if fields[i].number <= previous
            || fields[i].number > crate::wire::MAXIMUM_FIELD_NUMBER
        {
            return false;
        }
        previous = fields[i].number;
        i += 1;
    }
    true
}

/// Encodes `value` as `field`, key included, unless it holds the default value.
#[inline]
pub fn encode_field<T, B>(field: &FieldDescriptor, value: &T, buf: &mut B)
where
    T: ProtoEncode + IsProtoDefault,
    B: bytes::BufMut,
{
    debug_assert_eq!(T::WIRE_TYPE, field.wire_type, "field '{}'", field.name);
    if !value.is_proto_default() {
        encode_key(field.wire_type, field.number, buf);
        value.encode(buf);
    }
}

/// Returns the number of bytes [`encode_field`] writes for `value`.
#[inline]
pub fn encoded_field_len<T>(field: &FieldDescriptor, value: &T) -> usize
where
    T: ProtoEncode + IsProtoDefault,
{
    if value.is_proto_default() {
        0
    } else {
        encoded_key_len(field.number) + value.encoded_len()
    }
}

pub use default_check::IsProtoDefault;

// Re-export message types and helpers
pub use message::{
    encode_message_field, encoded_message_field_len, merge_message, merge_message_field,
    FieldMismatch, ProtoMessage,
};
