//! Message-level types and helpers.

use alloc::vec::Vec;

use super::{FieldDescriptor, ProtoDecode, ProtoEncode, ProtoType};
use crate::config::{DecodeConfig, DecodeContext};
use crate::error::{DecodeError, EncodeError, IllegalTagReason};
use crate::leb128::LebCodec;
use crate::util::{unlikely, CastFrom};
use crate::wire::{decode_key, skip_field, WireType};

/// Trait for protobuf message types.
///
/// Implementors describe their fields with a static [`FieldDescriptor`]
/// table, decode a single known field in [`ProtoMessage::merge_field`], and
/// write their fields in ascending field-number order in
/// [`ProtoMessage::encode_raw`]. Everything else, the decode loop, unknown
/// field skipping, and buffer sizing, is provided.
pub trait ProtoMessage: Default {
    /// Fully qualified protobuf name of the message, e.g. `messages.ID`.
    const NAME: &'static str;

    /// Known fields, sorted by ascending field number.
    const FIELDS: &'static [FieldDescriptor];

    /// Decode the payload of a known field into `self`.
    ///
    /// Called by [`merge_message`] after the field's key has been consumed and
    /// its wire type checked against `field`.
    fn merge_field<B: bytes::Buf>(
        &mut self,
        field: &'static FieldDescriptor,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>;

    /// Encode the message body (without length prefix).
    fn encode_raw<B: bytes::BufMut>(&self, buf: &mut B);

    /// Returns the exact encoded length of the message body (without length
    /// prefix), without encoding it.
    fn encoded_len(&self) -> usize;

    /// Decode a message from a complete buffer.
    fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_config(buf, &DecodeConfig::default())
    }

    /// Decode a message from a complete buffer with the provided limits.
    ///
    /// Returns either a fully decoded message or an error, never a partially
    /// populated message.
    fn decode_with_config(buf: &[u8], config: &DecodeConfig) -> Result<Self, DecodeError> {
        let mut msg = Self::default();
        let mut slice = buf;
        match merge_message(&mut msg, &mut slice, DecodeContext::new(config)) {
            Ok(()) => Ok(msg),
            Err(err) => {
                tracing::debug!(
                    msg_type = Self::NAME,
                    len = buf.len(),
                    offset = buf.len() - slice.len(),
                    %err,
                    "failed to decode message"
                );
                Err(err)
            }
        }
    }

    /// Encode the message body into `buf`.
    ///
    /// Fails without writing anything if `buf` can't hold the entire message.
    fn encode<B: bytes::BufMut>(&self, buf: &mut B) -> Result<(), EncodeError> {
        let required = self.encoded_len();
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(EncodeError::InsufficientCapacity {
                required,
                remaining,
            });
        }
        self.encode_raw(buf);
        Ok(())
    }

    /// Encode the message body into a newly allocated, exactly sized buffer.
    ///
    /// # Panics
    ///
    /// If the number of bytes written disagrees with
    /// [`ProtoMessage::encoded_len`], which is a bug in the message's codec.
    fn encode_to_vec(&self) -> Vec<u8> {
        let len = self.encoded_len();
        let mut buf = Vec::with_capacity(len);
        self.encode_raw(&mut buf);
        assert_eq!(
            buf.len(),
            len,
            "{}: encoded length disagrees with encoded_len()",
            Self::NAME
        );
        buf
    }

    /// Encode the message body into [`bytes::Bytes`], for handing to a transport.
    fn encode_to_bytes(&self) -> bytes::Bytes {
        bytes::Bytes::from(self.encode_to_vec())
    }
}

/// Decode loop shared by all messages: merges every field in `buf` into `msg`.
///
/// Known fields are dispatched to [`ProtoMessage::merge_field`] after checking
/// their wire type, unknown fields are validated and discarded. Consumes the
/// entire buffer.
pub fn merge_message<M: ProtoMessage, B: bytes::Buf>(
    msg: &mut M,
    buf: &mut B,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    while buf.has_remaining() {
        let (wire_type, field_number) = decode_key(buf)?.into_parts();
        if unlikely(wire_type == WireType::EGroup) {
            return Err(DecodeError::illegal_tag(
                IllegalTagReason::UnexpectedEndGroup,
            ));
        }

        match M::FIELDS.iter().find(|field| field.number == field_number) {
            Some(field) => {
                if unlikely(field.wire_type != wire_type) {
                    return Err(DecodeError::WireTypeMismatch {
                        message: M::NAME,
                        field: field.name,
                        expected: field.wire_type,
                        actual: wire_type,
                    });
                }
                msg.merge_field(field, buf, ctx)?;
            }
            None => {
                tracing::trace!(
                    msg_type = M::NAME,
                    field_number,
                    ?wire_type,
                    "skipping unknown field"
                );
                skip_field(wire_type, buf, ctx)?;
            }
        }
    }
    Ok(())
}

/// Merges a length-delimited embedded message from `buf` into `msg`.
///
/// The embedded message is decoded one level deeper than `ctx`.
#[inline]
pub fn merge_message_field<M: ProtoMessage, B: bytes::Buf>(
    msg: &mut M,
    buf: &mut B,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    let len = crate::wire::decode_len(buf)?;
    if unlikely(buf.remaining() < len) {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    let ctx = ctx.enter_recursion()?;
    merge_message(msg, &mut bytes::Buf::take(&mut *buf, len), ctx)
}

/// Helper to encode a message as a length-delimited field.
///
/// Writes the length prefix followed by the message body.
#[inline]
pub fn encode_message_field<M: ProtoMessage, B: bytes::BufMut>(msg: &M, buf: &mut B) {
    let msg_len = msg.encoded_len();
    u64::cast_from(msg_len).encode_leb128(buf);
    msg.encode_raw(buf);
}

/// Returns the encoded length of a message as a length-delimited field.
#[inline]
pub fn encoded_message_field_len<M: ProtoMessage>(msg: &M) -> usize {
    let msg_len = msg.encoded_len();
    u64::cast_from(msg_len).encoded_leb128_len() + msg_len
}

impl<M: ProtoMessage> ProtoType for Option<M> {
    const WIRE_TYPE: WireType = WireType::Len;
}

impl<M: ProtoMessage> ProtoDecode for Option<M> {
    /// Repeated occurrences of an embedded message merge into the first.
    #[inline]
    fn decode_into<B: bytes::Buf>(
        buf: &mut B,
        dst: &mut Self,
        _field: &'static FieldDescriptor,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let msg = dst.get_or_insert_with(M::default);
        merge_message_field(msg, buf, ctx)
    }
}

impl<M: ProtoMessage> ProtoEncode for Option<M> {
    #[inline]
    fn encode<B: bytes::BufMut>(&self, buf: &mut B) {
        if let Some(msg) = self {
            encode_message_field(msg, buf);
        }
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        match self {
            Some(msg) => encoded_message_field_len(msg),
            None => 0,
        }
    }
}

/// The first field found to differ between two messages of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{message}.{field}: values are not equal")]
pub struct FieldMismatch {
    pub message: &'static str,
    pub field: &'static str,
}
